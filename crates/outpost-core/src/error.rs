//! Error types for outpost-core

use crate::{BuildingId, ColonyId, ContractId, DefId};
use thiserror::Error;

/// Expected, user-driven refusals of a placement, upgrade, removal or contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("cell is already occupied by {0}")]
    CellOccupied(BuildingId),

    #[error("colony already has the maximum of {0} buildings")]
    BuildingCapReached(usize),

    #[error("at most {limit} {type_id} buildings allowed per planet")]
    TypeLimitReached { type_id: DefId, limit: usize },

    #[error("too close to {0} of the same type")]
    TooClose(BuildingId),

    #[error("position is not open space")]
    NoOpenSpace,

    #[error("insufficient resources")]
    InsufficientResources,

    #[error("building not found: {0}")]
    NotFound(BuildingId),

    #[error("{0} is under construction")]
    UnderConstruction(BuildingId),

    #[error("{0} is already at maximum level")]
    MaxLevelReached(BuildingId),

    #[error("insufficient cargo in origin stock")]
    InsufficientCargo,

    #[error("cargo of {units} units exceeds ship capacity {capacity}")]
    CargoExceedsShipCapacity { units: u64, capacity: u64 },

    #[error("all {0} ship slots are in use")]
    FleetAtCapacity(u32),

    #[error("cargo is empty")]
    EmptyCargo,
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown building type: {0}")]
    UnknownBuildingType(DefId),

    #[error("Unknown level {level} for building type {type_id}")]
    UnknownLevel { type_id: DefId, level: u32 },

    #[error("Unknown ship type: {0}")]
    UnknownShipType(DefId),

    #[error("Ship type {0} needs a positive speed")]
    InvalidShipSpeed(DefId),

    #[error("Unknown colony: {0}")]
    UnknownColony(ColonyId),

    #[error("Unknown contract: {0}")]
    UnknownContract(ContractId),

    #[error("Duplicate colony: {0}")]
    DuplicateColony(ColonyId),

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Get the rejection if this error is an expected validation failure
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Error::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
