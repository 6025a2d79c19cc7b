//! Colony - one planet's buildings and ledger, driven tick by tick
//!
//! A [`Colony`] fixes the order of work inside a tick:
//!
//! 1. [`BuildingRegistry::update`] finishes due constructions
//! 2. [`ResourceLedger::recompute_rates`] sees the current building set
//! 3. [`ResourceLedger::advance_to`] applies the elapsed time
//!
//! so a building completed this tick produces this tick, and rates are
//! never stale when stock moves.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::event::Event;
use crate::grid::GridPosition;
use crate::ledger::{RateSnapshot, ResourceLedger};
use crate::registry::{Building, BuildingRegistry};
use crate::surface::{BareSurface, Surface};
use crate::time::SimTime;
use crate::{BuildingId, ColonyConfig, ColonyId, DefId, ResourceAmount};
use std::fmt;
use std::sync::Arc;

/// Buildings, stock and surface of one planet
pub struct Colony {
    id: ColonyId,
    catalog: Arc<Catalog>,
    surface: Box<dyn Surface + Send + Sync>,
    ledger: ResourceLedger,
    registry: BuildingRegistry,
    now: SimTime,
}

impl Colony {
    /// Create an empty colony at simulated time `now`
    pub fn new(
        id: impl Into<ColonyId>,
        catalog: Arc<Catalog>,
        config: &ColonyConfig,
        now: SimTime,
    ) -> Self {
        let registry = BuildingRegistry::new(&catalog);
        let mut ledger = ResourceLedger::new(config);
        ledger.advance_to(now);
        Self {
            id: id.into(),
            catalog,
            surface: Box::new(BareSurface),
            ledger,
            registry,
            now,
        }
    }

    /// Assemble a colony from restored parts; rates are recomputed, never trusted
    pub fn from_parts(
        id: impl Into<ColonyId>,
        catalog: Arc<Catalog>,
        mut ledger: ResourceLedger,
        registry: BuildingRegistry,
        now: SimTime,
    ) -> Result<Self> {
        ledger.recompute_rates(registry.iter(), &catalog)?;
        ledger.advance_to(now);
        Ok(Self {
            id: id.into(),
            catalog,
            surface: Box::new(BareSurface),
            ledger,
            registry,
            now,
        })
    }

    /// Use a different surface for node lookups and open-space checks
    pub fn set_surface(&mut self, surface: impl Surface + Send + Sync + 'static) {
        self.surface = Box::new(surface);
    }

    pub fn id(&self) -> &ColonyId {
        &self.id
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn registry(&self) -> &BuildingRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Simulated time of the last tick
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Why `type_id` cannot be placed at `position`, if it cannot
    pub fn check_placement(&self, type_id: &DefId, position: GridPosition) -> Result<()> {
        self.registry.check_placement(
            &self.catalog,
            &self.ledger,
            self.surface.as_ref(),
            type_id,
            position,
        )
    }

    /// Whether `type_id` could be placed at `position` right now
    pub fn can_place(&self, type_id: &DefId, position: GridPosition) -> bool {
        self.check_placement(type_id, position).is_ok()
    }

    /// Place a building, paying its cost
    pub fn place(&mut self, type_id: &DefId, position: GridPosition) -> Result<Building> {
        self.registry.place(
            &self.catalog,
            &mut self.ledger,
            self.surface.as_ref(),
            type_id,
            position,
            self.now,
        )
    }

    /// Start upgrading a building
    pub fn upgrade(&mut self, id: BuildingId) -> Result<()> {
        self.registry
            .upgrade(&self.catalog, &mut self.ledger, id, self.now)
    }

    /// Remove a building; nothing is refunded
    ///
    /// Terminal buildings must also be released from the transport
    /// scheduler; [`Sector::remove_building`](crate::Sector::remove_building)
    /// does both.
    pub fn remove(&mut self, id: BuildingId) -> Result<Building> {
        self.registry.remove(id, self.now)
    }

    /// Owned copies of every building
    pub fn buildings_snapshot(&self) -> Vec<Building> {
        self.registry.snapshot()
    }

    /// Copy of the rates from the last tick
    pub fn rates(&self) -> RateSnapshot {
        self.ledger.rates().clone()
    }

    /// Copy of the current stock
    pub fn stock(&self) -> ResourceAmount {
        self.ledger.stock()
    }

    /// Step 1 of a tick: finish due constructions
    pub fn complete_construction(&mut self, now: SimTime) -> Vec<BuildingId> {
        self.now = now;
        self.registry.update(now)
    }

    /// Steps 2 and 3 of a tick: recompute rates, then apply elapsed time
    pub fn settle(&mut self, now: SimTime) -> Result<()> {
        self.now = now;
        self.ledger.mark_time(now);
        self.ledger
            .recompute_rates(self.registry.iter(), &self.catalog)?;
        self.ledger.advance_to(now);
        Ok(())
    }

    /// Run a full tick at simulated time `now`; returns the buildings completed
    pub fn tick(&mut self, now: SimTime) -> Result<Vec<BuildingId>> {
        let completed = self.complete_construction(now);
        self.settle(now)?;
        Ok(completed)
    }

    /// Take registry and ledger notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = self.registry.drain_events();
        events.extend(self.ledger.drain_events());
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        events
    }
}

impl fmt::Debug for Colony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colony")
            .field("id", &self.id)
            .field("buildings", &self.registry.len())
            .field("stock", &self.ledger.stock())
            .field("now", &self.now)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingTypeDef, StatBlock};
    use crate::event::EventKind;
    use crate::ResourceId;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::default()
                .with_building(BuildingTypeDef::new(
                    "power_plant",
                    "Power Plant",
                    StatBlock {
                        cost: ResourceAmount::new().with(ResourceId::CREDITS, 100.0),
                        build_time_seconds: 30.0,
                        production: ResourceAmount::new().with(ResourceId::ENERGY, 10.0),
                        ..StatBlock::default()
                    },
                ))
                .with_building(BuildingTypeDef::new(
                    "mine",
                    "Mine",
                    StatBlock {
                        build_time_seconds: 0.0,
                        production: ResourceAmount::new().with(ResourceId::IRON, 5.0),
                        energy_consumption: 3.0,
                        ..StatBlock::default()
                    },
                )),
        )
    }

    #[test]
    fn test_completed_building_produces_in_the_same_tick() {
        let mut colony = Colony::new("home", catalog(), &ColonyConfig::default(), 0.0);
        let plant = colony
            .place(&DefId::new("power_plant"), GridPosition::new(0.0, 0.0))
            .unwrap();
        assert_eq!(colony.stock().get("credits"), 900.0);

        assert!(colony.tick(29.0).unwrap().is_empty());
        assert_eq!(colony.rates().production.get("energy"), 0.0);

        assert_eq!(colony.tick(30.0).unwrap(), vec![plant.id]);
        assert_eq!(colony.rates().production.get("energy"), 10.0);

        // Rates cover the whole interval since the previous tick
        colony.tick(90.0).unwrap();
        let expected = 100.0 + 10.0 * 61.0 / 60.0;
        assert!((colony.stock().get("energy") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_mine_without_power_drains_energy() {
        let mut colony = Colony::new("home", catalog(), &ColonyConfig::default(), 0.0);
        colony
            .place(&DefId::new("mine"), GridPosition::new(0.0, 0.0))
            .unwrap();

        colony.tick(0.0).unwrap();
        assert_eq!(colony.rates().production.get("iron"), 0.0);
        colony.tick(60.0).unwrap();
        assert_eq!(colony.stock().get("energy"), 97.0);
        assert_eq!(colony.stock().get("iron"), 200.0);
    }

    #[test]
    fn test_from_parts_recomputes_rates() {
        let catalog = catalog();
        let mut colony = Colony::new("home", catalog.clone(), &ColonyConfig::default(), 0.0);
        colony
            .place(&DefId::new("power_plant"), GridPosition::new(0.0, 0.0))
            .unwrap();
        colony.tick(30.0).unwrap();

        let restored = Colony::from_parts(
            "home",
            catalog.clone(),
            colony.ledger().clone(),
            BuildingRegistry::restore(&catalog, colony.buildings_snapshot()),
            30.0,
        )
        .unwrap();
        assert_eq!(restored.rates(), colony.rates());
        assert_eq!(restored.buildings_snapshot(), colony.buildings_snapshot());
    }

    #[test]
    fn test_events_are_merged_in_time_order() {
        let mut colony = Colony::new("home", catalog(), &ColonyConfig::default(), 0.0);
        colony.drain_events();
        colony
            .place(&DefId::new("power_plant"), GridPosition::new(0.0, 0.0))
            .unwrap();
        colony.tick(30.0).unwrap();

        let events = colony.drain_events();
        assert!(matches!(events[0].kind, EventKind::BuildingPlaced { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, EventKind::BuildingBuilt { .. }) && e.at == 30.0));
        assert!(events.windows(2).all(|w| w[0].at <= w[1].at));
    }
}
