#![forbid(unsafe_code)]

use std::cell::Cell;

use glam::DVec3;
use region_spawn::prelude::*;
use tracing::info;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Stand-in for a world object. Its position comes from the template's `location` payload.
#[derive(Debug)]
pub struct DemoAsset {
    name: String,
    object_type: ObjectType,
    location: Option<DVec3>,
    active: Cell<bool>,
}

impl DemoAsset {
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Asset for DemoAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, _manager: &dyn AssetManager, region: &RegionInfo) -> Result<()> {
        self.active.set(true);
        info!(
            "Activated {} '{}' in {} at {:?}.",
            self.object_type, self.name, region.name, self.location
        );
        Ok(())
    }

    fn location(&self) -> Option<mint::Vector3<f64>> {
        self.location.map(Into::into)
    }
}

/// Builds a [`DemoAsset`] for every object type except those listed in `rejected`.
#[derive(Debug, Default)]
pub struct DemoFactory {
    rejected: Vec<ObjectType>,
}

impl DemoFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, object_type: impl Into<ObjectType>) -> Self {
        self.rejected.push(object_type.into());
        self
    }
}

impl AssetFactory for DemoFactory {
    fn create(
        &self,
        object_type: &str,
        template: &Template,
        _region: &RegionInfo,
    ) -> Result<Box<dyn Asset>> {
        if self.rejected.iter().any(|t| t == object_type) {
            return Err(Error::Asset(format!(
                "no asset implementation for object type '{object_type}'"
            )));
        }
        Ok(Box::new(DemoAsset {
            name: template.name.clone(),
            object_type: object_type.to_owned(),
            location: template.payload_point("location"),
            active: Cell::new(false),
        }))
    }
}

/// Placed template with a `location` payload.
pub fn placed(name: &str, object_type: &str, theater: &str, location: DVec3) -> Template {
    Template::new(name, object_type, theater)
        .with_payload("location", PayloadValue::Point(location))
}

/// Logs one line per spawned template of a report.
pub fn log_report(report: &GenerationReport) {
    info!(
        "Region '{}' stage {}: {} spawned, centroid {:?}, airspace {:?}.",
        report.region,
        report.stage,
        report.spawned.len(),
        report.centroid,
        report.airspace
    );
    for record in &report.spawned {
        info!(
            "  {:<24} {:<10} {:?}",
            record.template, record.object_type, record.reason
        );
    }
}
