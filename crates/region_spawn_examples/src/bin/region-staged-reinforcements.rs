use std::collections::HashMap;

use glam::{DVec2, DVec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use region_spawn::prelude::*;
use region_spawn_examples::{init_tracing, log_report, placed, DemoFactory};

const THEATER: &str = "Syria";

fn main() -> anyhow::Result<()> {
    init_tracing();

    let boundary = Boundary::triangulate(vec![
        DVec2::new(0.0, 0.0),
        DVec2::new(40_000.0, 0.0),
        DVec2::new(40_000.0, 20_000.0),
        DVec2::new(0.0, 20_000.0),
    ])?;
    let config = RegionConfig::new("valley", THEATER).with_airspace(false);
    let mut region = Region::try_new(config, boundary)?;

    let garrison = DVec3::new(10_000.0, 5_000.0, 0.0);
    region.add_template(placed("garrison", "infantry", THEATER, garrison))?;

    // Held back until their stage is generated.
    for (i, stage) in [2u32, 2, 3].into_iter().enumerate() {
        let location = DVec3::new(20_000.0 + 1_000.0 * i as f64, 10_000.0, 0.0);
        let template = placed(&format!("relief_{i}"), "armor", THEATER, location)
            .with_exclusion_group(format!("relief_wave_{stage}"))
            .with_stage(stage);
        tracing::info!("relief_{i}: {:?}", region.add_template(template)?);
    }
    tracing::info!("pending stages: {:?}", region.pending_stages());

    let generation = GenerationConfig::new(["infantry", "armor"]);
    let factory = DemoFactory::new();
    let mut manager: HashMap<String, Box<dyn Asset>> = HashMap::new();
    let mut ctx = SpawnContext::new(&generation, &factory, &mut manager);
    let mut rng = StdRng::seed_from_u64(7);

    log_report(&region.generate(&mut ctx, &mut rng)?);

    for stage in [2, 3, 2] {
        let report = region.generate_staged_templates(stage, &mut ctx, &mut rng)?;
        log_report(&report);
    }
    tracing::info!(
        "{} templates spawned in total, pending stages: {:?}",
        region.spawned().len(),
        region.pending_stages()
    );

    Ok(())
}
