//! Change notifications emitted by the simulation
//!
//! Components push events into an [`EventQueue`]; visualization, progress and
//! mission collaborators drain it whenever they like. Nothing requires a
//! consumer: when the queue is full the oldest events are dropped.

use crate::{BuildingId, ColonyId, ContractId, DefId, ResourceId, ShipId, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of undrained events kept per queue
pub const DEFAULT_QUEUE_LIMIT: usize = 4096;

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// A building was placed and started construction
    BuildingPlaced { building: BuildingId, type_id: DefId },
    /// A building was removed
    BuildingRemoved { building: BuildingId, type_id: DefId },
    /// A newly placed building finished construction
    BuildingBuilt { building: BuildingId, type_id: DefId },
    /// An upgrade finished
    BuildingUpgraded {
        building: BuildingId,
        type_id: DefId,
        level: u32,
    },
    /// A building started an upgrade
    UpgradeStarted {
        building: BuildingId,
        type_id: DefId,
        level: u32,
    },
    /// Stock of a resource kind changed
    StockChanged { kind: ResourceId, stock: f64 },
    /// Resources were gained by production, sales or unloading
    ResourceCollected { kind: ResourceId, amount: f64 },
    /// Energy production fell below consumption; other output is scaled by `ratio`
    EnergyShortage { ratio: f64 },
    /// Workforce demand exceeds supply; gated output is scaled by `ratio`
    WorkforceShortage { ratio: f64 },
    /// A transport contract was created and its cargo loaded
    ContractCreated {
        contract: ContractId,
        origin: ColonyId,
        destination: ColonyId,
    },
    /// A transport ship left its origin
    TransportDeparted { contract: ContractId, ship: ShipId },
    /// A transport arrived and its cargo was sold
    ContractCompleted { contract: ContractId, proceeds: f64 },
}

/// A timestamped event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Simulated time at which the event was emitted
    pub at: SimTime,
    /// What happened
    pub kind: EventKind,
}

impl Event {
    /// Create a new event
    pub fn new(at: SimTime, kind: EventKind) -> Self {
        Self { at, kind }
    }
}

/// Bounded FIFO of undrained events
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<Event>,
    limit: usize,
}

impl EventQueue {
    /// Create a queue with the default limit
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_QUEUE_LIMIT)
    }

    /// Create a queue holding at most `limit` events (at least 1)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Push an event, dropping the oldest one if the queue is full
    pub fn push(&mut self, at: SimTime, kind: EventKind) {
        if self.events.len() == self.limit {
            self.events.pop_front();
        }
        self.events.push_back(Event::new(at, kind));
    }

    /// Take all pending events in emission order
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    /// Iterate over pending events without removing them
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
