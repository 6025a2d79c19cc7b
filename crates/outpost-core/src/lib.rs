//! Outpost Core - colony production and logistics simulation
//!
//! This crate provides the numeric and state simulation behind a colony
//! economy on planet surfaces:
//! - Static content (`Catalog`: building types, placement rules, ship types, prices)
//! - Per-colony stock, caps and derived rates (`ResourceLedger`)
//! - Placed buildings with construction and upgrade lifecycle (`BuildingRegistry`)
//! - Cargo contracts between colonies (`TransportScheduler`)
//! - Tick drivers for one colony (`Colony`) or many (`Sector`)
//!
//! ## Tick Order
//!
//! Every tick runs construction completion, then rate recomputation, then
//! stock advancement, so rates are never stale when stock moves:
//!
//! ```
//! use outpost_core::{Colony, ColonyConfig, Catalog};
//! use std::sync::Arc;
//!
//! let mut colony = Colony::new("home", Arc::new(Catalog::default()), &ColonyConfig::default(), 0.0);
//! colony.tick(60.0).unwrap();
//! assert_eq!(colony.stock().get("credits"), 1000.0);
//! ```
//!
//! ## Headless
//!
//! Nothing here renders or plays sound. Visualization and progression
//! layers drain [`Event`]s whenever they like; the simulation runs the same
//! with no consumer.

mod catalog;
mod colony;
mod config;
mod error;
mod event;
mod grid;
mod identity;
mod ledger;
pub mod registry;
mod resource;
mod save;
mod sector;
mod surface;
pub mod time;
pub mod transport;

pub use catalog::{
    BuildingEffects, BuildingTypeDef, Catalog, CombatStats, NodeRequirement, PlacementRule,
    ShipTypeDef, StatBlock, DEFAULT_GRID_SIZE, DEFAULT_MAX_BUILDINGS,
};
pub use colony::Colony;
pub use config::ColonyConfig;
pub use error::{Error, Rejection, Result};
pub use event::{Event, EventKind, EventQueue, DEFAULT_QUEUE_LIMIT};
pub use grid::{GridCell, GridPosition};
pub use identity::{BuildingId, ColonyId, ContractId, DefId, NodeId, ShipId};
pub use ledger::{RateSnapshot, ResourceLedger};
pub use registry::{Building, BuildingRegistry, BuildingState, NodeLink};
pub use resource::{ResourceAmount, ResourceId, ResourceRates};
pub use save::{ColonySave, SAVE_VERSION};
pub use sector::Sector;
pub use surface::{BareSurface, NodeField, Obstacle, ResourceNode, Surface};
pub use time::{Clock, SimTime, Speed, Tick, SECONDS_PER_MINUTE};
pub use transport::{
    CompletedTransport, ContractStatus, Delivery, ScheduledTransport, TerminalRecord,
    TransportContract, TransportScheduler, TransportShip, TransportStatus,
};
