use std::collections::HashMap;

use glam::{DVec2, DVec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use region_spawn::prelude::*;
use region_spawn_examples::{init_tracing, log_report, placed, DemoFactory};

const THEATER: &str = "Caucasus";

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A 60 km square around the origin.
    let boundary = Boundary::triangulate(vec![
        DVec2::new(-30_000.0, -30_000.0),
        DVec2::new(30_000.0, -30_000.0),
        DVec2::new(30_000.0, 30_000.0),
        DVec2::new(-30_000.0, 30_000.0),
    ])?;

    // Between one and two of the SAM candidates, every armor template.
    let config = RegionConfig::new("north", THEATER)
        .with_priority(10)
        .with_limits("sam", SpawnLimits::try_new(1, 2)?);
    let mut region = Region::try_new(config, boundary)?;

    region.add_template(
        placed("sa6_north", "sam", THEATER, DVec3::new(5_000.0, 4_000.0, 0.0))
            .with_exclusion_group("north_long_range"),
    )?;
    region.add_template(
        placed("sa10_north", "sam", THEATER, DVec3::new(6_000.0, 2_000.0, 0.0))
            .with_exclusion_group("north_long_range"),
    )?;
    region.add_template(placed("sa8_east", "sam", THEATER, DVec3::new(12_000.0, 0.0, 0.0)))?;
    region.add_template(
        placed("ewr_hill", "sam", THEATER, DVec3::new(0.0, 15_000.0, 0.0)).with_spawn_always(true),
    )?;
    region.add_template(placed("t72_column", "armor", THEATER, DVec3::new(-8_000.0, 0.0, 0.0)))?;
    region.add_template(placed("bmp_column", "armor", THEATER, DVec3::new(-9_000.0, 500.0, 0.0)))?;

    // Wrong theater: skipped with a warning, not an error.
    let skipped = region.add_template(Template::new("sa2_nevada", "sam", "Nevada"))?;
    tracing::info!("sa2_nevada: {:?}", skipped);

    let generation = GenerationConfig::new(["sam", "armor"]);
    let factory = DemoFactory::new();
    let mut manager: HashMap<String, Box<dyn Asset>> = HashMap::new();
    let mut ctx = SpawnContext::new(&generation, &factory, &mut manager);
    let mut rng = StdRng::seed_from_u64(2025);

    let mut sink = VecSink::new();
    let report = region.generate_with_events(&mut ctx, &mut rng, &mut sink)?;
    log_report(&report);
    tracing::info!("{} events, state {:?}.", sink.len(), region.state());

    for point in [DVec2::new(0.0, 0.0), DVec2::new(45_000.0, 0.0)] {
        tracing::info!("{:?} inside 'north': {}", point, region.is_inside(point));
    }

    // A region generates once.
    if let Err(err) = region.generate(&mut ctx, &mut rng) {
        tracing::warn!("{err}");
    }

    Ok(())
}
