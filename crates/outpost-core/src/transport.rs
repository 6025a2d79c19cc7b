//! Transport scheduler - cargo contracts between colonies
//!
//! Contract lifecycle:
//!
//! ```text
//! create_contract() ──> Pending ──(now >= departure)──> InTransit ──(now >= arrival)──> Completed
//!        │
//!        └─ cargo debited from the origin ledger here, never refunded
//! ```
//!
//! The scheduler owns no ledgers. [`TransportScheduler::update`] collects
//! [`Delivery`] records and the caller applies them to the right colony,
//! so one scheduler can serve every colony in a sector.

use crate::catalog::{BuildingEffects, Catalog};
use crate::error::{Error, Rejection, Result};
use crate::event::{Event, EventKind, EventQueue};
use crate::grid::GridPosition;
use crate::ledger::ResourceLedger;
use crate::registry::BuildingRegistry;
use crate::time::SimTime;
use crate::{BuildingId, ColonyConfig, ColonyId, ContractId, DefId, ResourceAmount, ShipId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Contract status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Pending,
    InTransit,
    Completed,
}

/// An agreement to move cargo from one colony to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportContract {
    pub id: ContractId,
    pub origin: ColonyId,
    pub destination: ColonyId,
    pub cargo: ResourceAmount,
    pub ship_type: DefId,
    /// Shipping cost, recorded but not charged
    pub cost: f64,
    pub status: ContractStatus,
}

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportStatus {
    Scheduled,
    InTransit,
    Completed,
}

/// The timetable of one contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTransport {
    pub contract: ContractId,
    pub ship: ShipId,
    pub departure: SimTime,
    pub arrival: SimTime,
    pub status: TransportStatus,
}

/// A ship in flight; lives from scheduling until arrival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportShip {
    pub id: ShipId,
    pub contract: ContractId,
    pub ship_type: DefId,
    /// Owned copy of the contract cargo
    pub cargo: ResourceAmount,
}

/// A finished contract with its timetable and sale value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTransport {
    pub contract: TransportContract,
    pub transport: ScheduledTransport,
    pub proceeds: f64,
}

/// Proceeds owed to a colony for a completed contract
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub contract: ContractId,
    /// Colony that is paid
    pub colony: ColonyId,
    pub cargo: ResourceAmount,
    pub proceeds: f64,
}

impl Delivery {
    /// Credit the proceeds in the ledger's currency; returns the amount applied
    pub fn apply(&self, ledger: &mut ResourceLedger) -> f64 {
        let currency = ledger.currency().clone();
        ledger.credit(&currency, self.proceeds)
    }
}

/// A terminal building known to the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRecord {
    pub colony: ColonyId,
    pub building: BuildingId,
    pub ship_capacity: u32,
    pub storage_capacity: f64,
    pub transfer_speed: f64,
    /// Cargo waiting to be unloaded into the colony
    pub buffer: ResourceAmount,
}

impl TerminalRecord {
    fn new(colony: ColonyId, building: BuildingId, effects: &BuildingEffects) -> Self {
        let mut record = Self {
            colony,
            building,
            ship_capacity: 0,
            storage_capacity: 0.0,
            transfer_speed: 0.0,
            buffer: ResourceAmount::new(),
        };
        record.apply_effects(effects);
        record
    }

    fn apply_effects(&mut self, effects: &BuildingEffects) {
        self.ship_capacity = effects.ship_capacity;
        self.storage_capacity = effects.storage_capacity.max(0.0);
        self.transfer_speed = effects.transfer_speed.max(0.0);
    }

    /// Free buffer space in cargo units
    pub fn free_space(&self) -> f64 {
        (self.storage_capacity - self.buffer.total_units()).max(0.0)
    }
}

/// Contracts, ships and terminals for every colony in a sector
#[derive(Debug, Clone)]
pub struct TransportScheduler {
    departure_delay: f64,
    base_rate_per_unit: f64,
    locations: IndexMap<ColonyId, GridPosition>,
    contracts: IndexMap<ContractId, TransportContract>,
    transports: IndexMap<ContractId, ScheduledTransport>,
    ships: IndexMap<ShipId, TransportShip>,
    completed: IndexMap<ContractId, CompletedTransport>,
    terminals: IndexMap<(ColonyId, BuildingId), TerminalRecord>,
    next_contract: u64,
    next_ship: u64,
    now: SimTime,
    events: EventQueue,
}

impl TransportScheduler {
    /// Create a scheduler using the transport settings of `config`
    pub fn new(config: &ColonyConfig) -> Self {
        Self {
            departure_delay: config.departure_delay_seconds(),
            base_rate_per_unit: config.base_rate_per_unit(),
            locations: IndexMap::new(),
            contracts: IndexMap::new(),
            transports: IndexMap::new(),
            ships: IndexMap::new(),
            completed: IndexMap::new(),
            terminals: IndexMap::new(),
            next_contract: 1,
            next_ship: 1,
            now: 0.0,
            events: EventQueue::new(),
        }
    }

    /// Record where a colony is; transport distance is measured between these points
    pub fn set_location(&mut self, colony: ColonyId, position: GridPosition) {
        self.locations.insert(colony, position);
    }

    /// Forget a colony's location
    pub fn remove_location(&mut self, colony: &ColonyId) -> Option<GridPosition> {
        self.locations.shift_remove(colony)
    }

    /// Position of a colony
    pub fn location(&self, colony: &ColonyId) -> Option<GridPosition> {
        self.locations.get(colony).copied()
    }

    /// Distance between two known colonies
    pub fn distance(&self, origin: &ColonyId, destination: &ColonyId) -> Result<f64> {
        let from = self
            .location(origin)
            .ok_or_else(|| Error::UnknownColony(origin.clone()))?;
        let to = self
            .location(destination)
            .ok_or_else(|| Error::UnknownColony(destination.clone()))?;
        Ok(from.distance_to(&to))
    }

    /// Shipping cost for `units` over `distance` with a ship's fuel multiplier
    pub fn shipping_cost(&self, units: f64, fuel_multiplier: f64, distance: f64) -> f64 {
        units * self.base_rate_per_unit * fuel_multiplier * distance.max(1.0)
    }

    /// Create a contract, loading its cargo from the origin ledger
    ///
    /// The cargo is debited immediately and the transport is scheduled in
    /// the same call. Fails closed: on any rejection the ledger is unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn create_contract(
        &mut self,
        ledger: &mut ResourceLedger,
        catalog: &Catalog,
        cargo: ResourceAmount,
        ship_type: &DefId,
        origin: &ColonyId,
        destination: &ColonyId,
        now: SimTime,
    ) -> Result<TransportContract> {
        let ship = catalog.ship_type(ship_type)?;
        if !ship.has_valid_speed() {
            return Err(Error::InvalidShipSpeed(ship_type.clone()));
        }
        let distance = self.distance(origin, destination)?;

        let units = cargo.total_units();
        if cargo.is_empty() || units <= 0.0 {
            return Err(Rejection::EmptyCargo.into());
        }
        if units > ship.cargo_capacity {
            return Err(Rejection::CargoExceedsShipCapacity {
                units: units.ceil() as u64,
                capacity: ship.cargo_capacity.max(0.0) as u64,
            }
            .into());
        }
        if let Some(capacity) = self.fleet_capacity(origin) {
            if self.active_count(origin) >= capacity as usize {
                return Err(Rejection::FleetAtCapacity(capacity).into());
            }
        }

        ledger.mark_time(now);
        if !ledger.spend(&cargo) {
            return Err(Rejection::InsufficientCargo.into());
        }

        let contract = TransportContract {
            id: ContractId::new(self.next_contract),
            origin: origin.clone(),
            destination: destination.clone(),
            cargo,
            ship_type: ship_type.clone(),
            cost: self.shipping_cost(units, ship.fuel_multiplier, distance),
            status: ContractStatus::Pending,
        };
        self.next_contract += 1;

        info!(
            contract = %contract.id,
            origin = %origin,
            destination = %destination,
            units,
            cost = contract.cost,
            "contract created"
        );
        self.events.push(
            now,
            EventKind::ContractCreated {
                contract: contract.id,
                origin: origin.clone(),
                destination: destination.clone(),
            },
        );
        self.contracts.insert(contract.id, contract.clone());
        self.schedule_transport(catalog, contract.id, now)?;
        Ok(contract)
    }

    /// Put a pending contract on the timetable and launch its ship
    pub fn schedule_transport(
        &mut self,
        catalog: &Catalog,
        contract_id: ContractId,
        now: SimTime,
    ) -> Result<ScheduledTransport> {
        let contract = self
            .contracts
            .get(&contract_id)
            .ok_or(Error::UnknownContract(contract_id))?;
        let ship_def = catalog.ship_type(&contract.ship_type)?;
        let distance = self.distance(&contract.origin, &contract.destination)?;
        if !ship_def.has_valid_speed() {
            return Err(Error::InvalidShipSpeed(ship_def.id.clone()));
        }
        let travel = distance / ship_def.speed;

        let ship = TransportShip {
            id: ShipId::new(self.next_ship),
            contract: contract_id,
            ship_type: contract.ship_type.clone(),
            cargo: contract.cargo.clone(),
        };
        self.next_ship += 1;

        let departure = now + self.departure_delay;
        let transport = ScheduledTransport {
            contract: contract_id,
            ship: ship.id,
            departure,
            arrival: departure + travel,
            status: TransportStatus::Scheduled,
        };
        debug!(
            contract = %contract_id,
            ship = %ship.id,
            departure,
            arrival = transport.arrival,
            "transport scheduled"
        );

        // A re-schedule replaces the previous ship
        if let Some(old) = self.transports.insert(contract_id, transport.clone()) {
            self.ships.shift_remove(&old.ship);
        }
        self.ships.insert(ship.id, ship);
        Ok(transport)
    }

    /// Advance every transport to `now` and collect the proceeds owed
    ///
    /// A transport whose departure and arrival have both passed completes in
    /// a single call.
    pub fn update(&mut self, now: SimTime, catalog: &Catalog) -> Vec<Delivery> {
        self.now = now;

        let mut arrived = Vec::new();
        for transport in self.transports.values_mut() {
            if transport.status == TransportStatus::Scheduled && now >= transport.departure {
                transport.status = TransportStatus::InTransit;
                if let Some(contract) = self.contracts.get_mut(&transport.contract) {
                    contract.status = ContractStatus::InTransit;
                }
                debug!(contract = %transport.contract, ship = %transport.ship, "transport departed");
                self.events.push(
                    now,
                    EventKind::TransportDeparted {
                        contract: transport.contract,
                        ship: transport.ship,
                    },
                );
            }
            if transport.status == TransportStatus::InTransit && now >= transport.arrival {
                arrived.push(transport.contract);
            }
        }

        let mut deliveries = Vec::with_capacity(arrived.len());
        for contract_id in arrived {
            let (Some(mut transport), Some(mut contract)) = (
                self.transports.shift_remove(&contract_id),
                self.contracts.shift_remove(&contract_id),
            ) else {
                continue;
            };
            let cargo = match self.ships.shift_remove(&transport.ship) {
                Some(ship) => ship.cargo,
                None => contract.cargo.clone(),
            };
            let proceeds: f64 = cargo
                .iter()
                .map(|(kind, units)| units * catalog.price_of(kind))
                .sum();

            transport.status = TransportStatus::Completed;
            contract.status = ContractStatus::Completed;
            info!(contract = %contract_id, proceeds, "contract completed");
            self.events.push(
                now,
                EventKind::ContractCompleted {
                    contract: contract_id,
                    proceeds,
                },
            );

            deliveries.push(Delivery {
                contract: contract_id,
                colony: contract.origin.clone(),
                cargo,
                proceeds,
            });
            self.completed.insert(
                contract_id,
                CompletedTransport {
                    contract,
                    transport,
                    proceeds,
                },
            );
        }
        deliveries
    }

    /// A contract by ID, active or completed
    pub fn contract(&self, id: ContractId) -> Option<&TransportContract> {
        self.contracts
            .get(&id)
            .or_else(|| self.completed.get(&id).map(|c| &c.contract))
    }

    /// Timetable of an active contract
    pub fn transport(&self, contract: ContractId) -> Option<&ScheduledTransport> {
        self.transports.get(&contract)
    }

    /// A ship in flight
    pub fn ship(&self, id: ShipId) -> Option<&TransportShip> {
        self.ships.get(&id)
    }

    /// Active (not yet completed) contracts
    pub fn active_contracts(&self) -> impl Iterator<Item = &TransportContract> {
        self.contracts.values()
    }

    /// Completed contracts, oldest first
    pub fn completed(&self) -> impl Iterator<Item = &CompletedTransport> {
        self.completed.values()
    }

    /// The record of a completed contract
    pub fn completed_transport(&self, id: ContractId) -> Option<&CompletedTransport> {
        self.completed.get(&id)
    }

    /// Number of active transports leaving `origin`
    pub fn active_count(&self, origin: &ColonyId) -> usize {
        self.contracts
            .values()
            .filter(|c| &c.origin == origin)
            .count()
    }

    /// Concurrent transports allowed from `colony`; `None` when it has no terminals
    pub fn fleet_capacity(&self, colony: &ColonyId) -> Option<u32> {
        let mut terminals = self.terminals_of(colony).peekable();
        terminals.peek()?;
        Some(terminals.map(|t| t.ship_capacity).sum())
    }

    /// Register a terminal, or refresh its capacities if already known
    pub fn register_terminal(
        &mut self,
        colony: &ColonyId,
        building: BuildingId,
        effects: &BuildingEffects,
    ) {
        let key = (colony.clone(), building);
        match self.terminals.get_mut(&key) {
            Some(record) => record.apply_effects(effects),
            None => {
                info!(colony = %colony, building = %building, "terminal registered");
                self.terminals
                    .insert(key, TerminalRecord::new(colony.clone(), building, effects));
            }
        }
    }

    /// Release a terminal; its buffered cargo is discarded
    pub fn unregister_terminal(
        &mut self,
        colony: &ColonyId,
        building: BuildingId,
    ) -> Option<TerminalRecord> {
        let record = self.terminals.shift_remove(&(colony.clone(), building))?;
        if !record.buffer.is_empty() && record.buffer.total_units() > 0.0 {
            warn!(
                colony = %colony,
                building = %building,
                buffer = %record.buffer,
                "terminal removed with cargo in its buffer"
            );
        } else {
            info!(colony = %colony, building = %building, "terminal unregistered");
        }
        Some(record)
    }

    /// Match the colony's terminal records to its completed terminal buildings
    ///
    /// Terminals mid-upgrade keep their previous capacities until the upgrade
    /// completes.
    pub fn sync_terminals(
        &mut self,
        colony: &ColonyId,
        registry: &BuildingRegistry,
        catalog: &Catalog,
    ) -> Result<()> {
        for building in registry.iter().filter(|b| !b.is_constructing()) {
            let effects = &catalog.stats_for(&building.type_id, building.level)?.effects;
            if effects.is_terminal() {
                self.register_terminal(colony, building.id, effects);
            }
        }
        let stale: Vec<BuildingId> = self
            .terminals_of(colony)
            .map(|t| t.building)
            .filter(|id| registry.get(*id).is_none())
            .collect();
        for id in stale {
            self.unregister_terminal(colony, id);
        }
        Ok(())
    }

    /// Terminal records of one colony
    pub fn terminals_of<'a>(
        &'a self,
        colony: &'a ColonyId,
    ) -> impl Iterator<Item = &'a TerminalRecord> + 'a {
        self.terminals.values().filter(move |t| &t.colony == colony)
    }

    /// A terminal record
    pub fn terminal(&self, colony: &ColonyId, building: BuildingId) -> Option<&TerminalRecord> {
        self.terminals.get(&(colony.clone(), building))
    }

    /// Put cargo into a terminal's buffer; returns what did not fit
    pub fn deposit(
        &mut self,
        colony: &ColonyId,
        building: BuildingId,
        cargo: &ResourceAmount,
    ) -> Result<ResourceAmount> {
        let record = self
            .terminals
            .get_mut(&(colony.clone(), building))
            .ok_or(Rejection::NotFound(building))?;

        let mut room = record.free_space();
        let mut excess = ResourceAmount::new();
        for (kind, units) in cargo.iter() {
            let units = units.max(0.0);
            let stored = units.min(room);
            if stored > 0.0 {
                record.buffer.add(kind.clone(), stored);
                room -= stored;
            }
            if units > stored {
                excess.add(kind.clone(), units - stored);
            }
        }
        Ok(excess)
    }

    /// Unload each of the colony's terminal buffers into its ledger
    ///
    /// Each kind moves at most `transfer_speed * elapsed_seconds` per tick,
    /// never more than is buffered. Cargo the ledger cannot take stays put.
    pub fn drain_terminals(
        &mut self,
        colony: &ColonyId,
        ledger: &mut ResourceLedger,
        elapsed_seconds: f64,
    ) {
        if !(elapsed_seconds.is_finite() && elapsed_seconds > 0.0) {
            return;
        }
        for record in self.terminals.values_mut().filter(|t| &t.colony == colony) {
            let nominal = record.transfer_speed * elapsed_seconds;
            let kinds: Vec<_> = record.buffer.iter().map(|(k, v)| (k.clone(), v)).collect();
            for (kind, buffered) in kinds {
                let moved = buffered.min(nominal);
                if moved <= 0.0 {
                    continue;
                }
                let applied = ledger.credit(&kind, moved).max(0.0);
                record.buffer.set(kind, buffered - applied);
            }
        }
    }

    /// Take the pending change notifications
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}
