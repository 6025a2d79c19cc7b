//! Headless Colony Demo
//!
//! Loads the standard content pack, founds two colonies, builds up the first
//! one and ships its iron to the second. Progress is logged through
//! `tracing`; set `--verbose` for per-tick detail.

use outpost_core::{
    ColonyId, ColonySave, DefId, EventKind, GridPosition, NodeField, ResourceAmount, ResourceId,
    Sector, Speed,
};
use std::sync::Arc;
use tracing::{info, warn, Level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let verbose = std::env::args().any(|a| a == "--verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    println!("=== Outpost Headless Colony Demo ===\n");

    let content = outpost_script::standard()?;
    let catalog = Arc::new(content.catalog);
    let mut sector = Sector::new(catalog.clone(), content.config);

    let home = ColonyId::new("kepler");
    let market = ColonyId::new("tau_ceti");

    // An iron deposit next to the planned mine
    let mut surface = NodeField::new();
    surface.add_node(ResourceId::IRON, GridPosition::new(6.0, 0.0));
    surface.add_obstacle(GridPosition::new(-20.0, -20.0), 6.0);

    sector
        .add_colony(home.clone(), GridPosition::new(0.0, 0.0))?
        .set_surface(surface);
    sector.add_colony(market.clone(), GridPosition::new(600.0, 800.0))?;

    let plan = [
        ("power_plant", GridPosition::new(0.0, 0.0)),
        ("power_plant", GridPosition::new(0.0, 6.0)),
        ("mine", GridPosition::new(4.0, 0.0)),
        ("habitat", GridPosition::new(-6.0, 0.0)),
        ("mine", GridPosition::new(-20.0, -20.0)),
    ];
    for (type_id, position) in plan {
        match sector.place(&home, &DefId::new(type_id), position) {
            Ok(building) => println!("Placed {} ({}) at {}", type_id, building.id, building.position),
            Err(e) => println!("Could not place {} at {}: {}", type_id, position, e),
        }
    }

    sector.set_speed(Speed::VeryFast);
    println!(
        "\nRunning 3 simulated minutes at {:?} speed...\n",
        Speed::VeryFast
    );

    let mut shipped = false;
    while sector.now() < 180.0 {
        let now = sector.tick(1.0)?;

        if !shipped && now >= 60.0 {
            let cargo = ResourceAmount::new().with(ResourceId::IRON, 40.0);
            match sector.create_contract(cargo, &DefId::new("small"), &home, &market) {
                Ok(contract) => {
                    println!(
                        "[t={:>5.1}s] Contract {} created, cost {:.1}",
                        now, contract.id, contract.cost
                    );
                    shipped = true;
                }
                Err(e) => warn!(error = %e, "contract not created yet"),
            }
        }

        for (colony, event) in sector.drain_events() {
            match event.kind {
                EventKind::BuildingBuilt { type_id, building } => println!(
                    "[t={:>5.1}s] {}: {} {} finished",
                    event.at, colony, type_id, building
                ),
                EventKind::EnergyShortage { ratio } => println!(
                    "[t={:>5.1}s] {}: brownout, output at {:.0}%",
                    event.at,
                    colony,
                    ratio * 100.0
                ),
                EventKind::ContractCompleted { contract, proceeds } => println!(
                    "[t={:>5.1}s] {}: {} sold for {:.1}",
                    event.at, colony, contract, proceeds
                ),
                _ => {}
            }
        }
    }

    println!("\n=== Final State ===");
    for colony in sector.colonies() {
        let rates = colony.rates();
        println!("{} ({} buildings)", colony.id(), colony.registry().len());
        println!("  stock: {}", colony.stock());
        println!("  production: {}", rates.production);
        println!("  consumption: {}", rates.consumption);
        for building in colony.buildings_snapshot() {
            if building.is_constructing() {
                println!(
                    "  {} {} level {} at {:.0}%",
                    building.type_id,
                    building.id,
                    building.level,
                    building.progress(colony.now()) * 100.0
                );
            }
        }
    }

    let save = ColonySave::capture(sector.colony(&home)?);
    let text = save.to_ron()?;
    info!(bytes = text.len(), binary = save.to_bytes()?.len(), "colony saved");

    let restored = ColonySave::from_ron(&text)?.restore(catalog, sector.config())?;
    println!(
        "\nRestored {} with {} buildings, next id {}",
        restored.id(),
        restored.registry().len(),
        restored.registry().next_id()
    );

    Ok(())
}
