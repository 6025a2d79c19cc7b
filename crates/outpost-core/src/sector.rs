//! Sector - every colony, the shared transport scheduler and the clock
//!
//! One [`Sector::tick`] advances the clock and then, for each colony in
//! insertion order:
//!
//! 1. finishes due constructions
//! 2. syncs terminal buildings with the scheduler
//! 3. recomputes rates and applies the elapsed time
//! 4. unloads terminal buffers into the ledger
//!
//! After all colonies have ticked, transports are advanced and completed
//! contracts pay their origin colony.

use crate::catalog::Catalog;
use crate::colony::Colony;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::grid::GridPosition;
use crate::registry::Building;
use crate::time::{Clock, SimTime, Speed};
use crate::transport::{TransportContract, TransportScheduler};
use crate::{BuildingId, ColonyConfig, ColonyId, DefId, ResourceAmount};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// All colonies sharing one catalog, one clock and one transport network
#[derive(Debug)]
pub struct Sector {
    catalog: Arc<Catalog>,
    config: ColonyConfig,
    colonies: IndexMap<ColonyId, Colony>,
    scheduler: TransportScheduler,
    clock: Clock,
    previous_speed: Speed,
}

impl Sector {
    /// Create an empty sector; new colonies start from `config`
    pub fn new(catalog: Arc<Catalog>, config: ColonyConfig) -> Self {
        Self {
            scheduler: TransportScheduler::new(&config),
            catalog,
            config,
            colonies: IndexMap::new(),
            clock: Clock::new(),
            previous_speed: Speed::Normal,
        }
    }

    /// Resume a sector at a given simulated time
    pub fn starting_at(catalog: Arc<Catalog>, config: ColonyConfig, now: SimTime) -> Self {
        Self {
            clock: Clock::starting_at(now),
            ..Self::new(catalog, config)
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.clock.now
    }

    /// Change the game speed
    pub fn set_speed(&mut self, speed: Speed) {
        if !speed.is_paused() {
            self.previous_speed = speed;
        }
        self.clock.set_speed(speed);
    }

    /// Pause, or resume at the last running speed
    pub fn toggle_pause(&mut self) -> Speed {
        if !self.clock.speed.is_paused() {
            self.previous_speed = self.clock.speed;
        }
        self.clock.toggle_pause(self.previous_speed)
    }

    /// Found a new colony at `position`
    pub fn add_colony(
        &mut self,
        id: impl Into<ColonyId>,
        position: GridPosition,
    ) -> Result<&mut Colony> {
        let id = id.into();
        let colony = Colony::new(id.clone(), self.catalog.clone(), &self.config, self.now());
        self.insert_colony(colony, position)?;
        self.colony_mut(&id)
    }

    /// Add an existing (for example restored) colony at `position`
    pub fn insert_colony(&mut self, colony: Colony, position: GridPosition) -> Result<()> {
        let id = colony.id().clone();
        if self.colonies.contains_key(&id) {
            return Err(Error::DuplicateColony(id));
        }
        info!(colony = %id, position = %position, "colony added");
        self.scheduler.set_location(id.clone(), position);
        self.colonies.insert(id, colony);
        Ok(())
    }

    /// Remove a colony together with its terminals and location
    ///
    /// Contracts already in flight still complete, but their proceeds are
    /// dropped once the origin is gone.
    pub fn remove_colony(&mut self, id: &ColonyId) -> Result<Colony> {
        let colony = self
            .colonies
            .shift_remove(id)
            .ok_or_else(|| Error::UnknownColony(id.clone()))?;
        let terminals: Vec<BuildingId> =
            self.scheduler.terminals_of(id).map(|t| t.building).collect();
        for building in terminals {
            self.scheduler.unregister_terminal(id, building);
        }
        self.scheduler.remove_location(id);
        info!(colony = %id, "colony removed");
        Ok(colony)
    }

    pub fn colony(&self, id: &ColonyId) -> Result<&Colony> {
        self.colonies
            .get(id)
            .ok_or_else(|| Error::UnknownColony(id.clone()))
    }

    pub fn colony_mut(&mut self, id: &ColonyId) -> Result<&mut Colony> {
        self.colonies
            .get_mut(id)
            .ok_or_else(|| Error::UnknownColony(id.clone()))
    }

    /// Iterate over colonies in insertion order
    pub fn colonies(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    pub fn scheduler(&self) -> &TransportScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TransportScheduler {
        &mut self.scheduler
    }

    /// Place a building in a colony
    pub fn place(
        &mut self,
        colony: &ColonyId,
        type_id: &DefId,
        position: GridPosition,
    ) -> Result<Building> {
        self.colony_mut(colony)?.place(type_id, position)
    }

    /// Remove a building and release its terminal record, if any
    pub fn remove_building(&mut self, colony: &ColonyId, building: BuildingId) -> Result<Building> {
        let removed = self.colony_mut(colony)?.remove(building)?;
        self.scheduler.unregister_terminal(colony, building);
        Ok(removed)
    }

    /// Load cargo at `origin` and ship it to `destination`
    pub fn create_contract(
        &mut self,
        cargo: ResourceAmount,
        ship_type: &DefId,
        origin: &ColonyId,
        destination: &ColonyId,
    ) -> Result<TransportContract> {
        if !self.colonies.contains_key(destination) {
            return Err(Error::UnknownColony(destination.clone()));
        }
        let now = self.clock.now;
        let colony = self
            .colonies
            .get_mut(origin)
            .ok_or_else(|| Error::UnknownColony(origin.clone()))?;
        self.scheduler.create_contract(
            colony.ledger_mut(),
            &self.catalog,
            cargo,
            ship_type,
            origin,
            destination,
            now,
        )
    }

    /// Advance the clock by `real_seconds` and run one tick; returns the new time
    pub fn tick(&mut self, real_seconds: f64) -> Result<SimTime> {
        let before = self.clock.now;
        let now = self.clock.advance(real_seconds);
        let elapsed = now - before;

        for (id, colony) in self.colonies.iter_mut() {
            colony.complete_construction(now);
            self.scheduler
                .sync_terminals(id, colony.registry(), &self.catalog)?;
            colony.settle(now)?;
            self.scheduler
                .drain_terminals(id, colony.ledger_mut(), elapsed);
        }

        for delivery in self.scheduler.update(now, &self.catalog) {
            match self.colonies.get_mut(&delivery.colony) {
                Some(colony) => {
                    let ledger = colony.ledger_mut();
                    ledger.mark_time(now);
                    delivery.apply(ledger);
                }
                None => warn!(
                    contract = %delivery.contract,
                    colony = %delivery.colony,
                    proceeds = delivery.proceeds,
                    "delivery for a colony that no longer exists"
                ),
            }
        }

        debug!(tick = self.clock.tick, now, elapsed, "sector tick");
        Ok(now)
    }

    /// Take every pending notification, tagged with its colony, oldest first
    ///
    /// Transport events are attributed to the contract's origin colony.
    pub fn drain_events(&mut self) -> Vec<(ColonyId, Event)> {
        let mut events: Vec<(ColonyId, Event)> = Vec::new();
        for (id, colony) in self.colonies.iter_mut() {
            events.extend(colony.drain_events().into_iter().map(|e| (id.clone(), e)));
        }
        for event in self.scheduler.drain_events() {
            let origin = match &event.kind {
                EventKind::ContractCreated { origin, .. } => Some(origin.clone()),
                EventKind::TransportDeparted { contract, .. }
                | EventKind::ContractCompleted { contract, .. } => self
                    .scheduler
                    .contract(*contract)
                    .map(|c| c.origin.clone()),
                _ => None,
            };
            if let Some(origin) = origin {
                events.push((origin, event));
            }
        }
        events.sort_by(|a, b| a.1.at.total_cmp(&b.1.at));
        events
    }
}
