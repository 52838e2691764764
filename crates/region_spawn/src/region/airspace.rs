//! Synthesis of the per-region airspace template.
use glam::DVec3;

use crate::region::GenerationConfig;
use crate::template::{PayloadValue, Template, AIRSPACE};

/// Payload key holding the airspace center as [`PayloadValue::Point`].
pub const CENTER: &str = "center";
/// Payload key holding the radius in world units.
pub const RADIUS: &str = "radius";
/// Payload key holding the owning coalition.
pub const COALITION: &str = "coalition";
/// Payload key holding the airspace priority.
pub const PRIORITY: &str = "priority";
/// Payload key holding the owning region's name.
pub const REGION: &str = "region";

/// Name of the airspace template synthesized for `region`.
pub fn template_name(region: &str) -> String {
    format!("{region}_airspace")
}

/// Builds the airspace volume of `region` centered at `center`.
pub fn synthesize(
    region: &str,
    theater: &str,
    center: DVec3,
    config: &GenerationConfig,
) -> Template {
    Template::new(template_name(region), AIRSPACE, theater)
        .with_spawn_always(true)
        .with_payload(CENTER, PayloadValue::Point(center))
        .with_payload(RADIUS, PayloadValue::Number(config.airspace_radius))
        .with_payload(
            COALITION,
            PayloadValue::Text(config.airspace_coalition.clone()),
        )
        .with_payload(
            PRIORITY,
            PayloadValue::Number(f64::from(config.airspace_priority)),
        )
        .with_payload(REGION, PayloadValue::Text(region.to_owned()))
}
