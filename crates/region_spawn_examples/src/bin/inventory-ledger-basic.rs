use region_spawn::prelude::*;
use region_spawn_examples::init_tracing;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut registry = InventoryRegistry::from_bases([
        (
            "Kutaisi",
            Inventory::new()
                .with_stock(Category::Airframes, "F-16C", 4)
                .with_stock(Category::Munitions, "AIM-120C", 16),
        ),
        (
            "Senaki",
            Inventory::new().with_stock(Category::GroundUnits, "M1A2", 10),
        ),
    ])?;

    let sortie = WithdrawalRequest::new()
        .with(Category::Airframes, "F-16C", 2)
        .with(Category::Munitions, "AIM-120C", 8);

    for attempt in 1..=3 {
        let kutaisi = registry.base_mut("Kutaisi")?;
        let result = kutaisi.try_withdraw(&sortie);
        if result.all {
            info!("sortie {attempt} supplied");
        } else {
            for (category, item) in result.insufficient() {
                warn!("sortie {attempt}: not enough {item} ({category})");
            }
        }
    }

    // Stock must strictly exceed the request; an exact match fails the check.
    let convoy = WithdrawalRequest::new().with(Category::GroundUnits, "M1A2", 10);
    let senaki = registry.base_mut("Senaki")?;
    info!("convoy of 10 valid: {}", senaki.check(&convoy).all);

    // Unchecked withdrawals may drive stock negative.
    senaki.withdraw(&convoy);
    senaki.withdraw(&convoy);
    info!("M1A2 left: {}", senaki.quantity(Category::GroundUnits, "M1A2"));

    for (base, inventory) in registry.iter() {
        info!("{base}: {:?}", inventory.stock());
    }

    Ok(())
}
