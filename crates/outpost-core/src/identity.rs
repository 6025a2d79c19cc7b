//! Identity types for buildings, contracts, ships and catalog definitions

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new ID
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a placed building, unique within one colony
    BuildingId,
    "building"
);

numeric_id!(
    /// Identifier of a transport contract, unique within one scheduler
    ContractId,
    "contract"
);

numeric_id!(
    /// Identifier of an in-flight transport ship
    ShipId,
    "ship"
);

numeric_id!(
    /// Identifier of a resource node owned by the planet surface
    NodeId,
    "node"
);

/// Identifier for a catalog definition (building type, ship type)
///
/// Uses a string-based ID for easy reference from RON content files
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    /// Create a new definition ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a colony (one planet's buildings and ledger)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColonyId(pub String);

impl ColonyId {
    /// Create a new colony ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColonyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "colony:{}", self.0)
    }
}

impl From<&str> for ColonyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_id() {
        let id = BuildingId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "building:42");
    }

    #[test]
    fn test_def_id() {
        let id = DefId::new("mine");
        assert_eq!(id.as_str(), "mine");
        assert_eq!(format!("{}", id), "mine");
        assert_eq!(DefId::from("mine"), id);
    }

    #[test]
    fn test_colony_id_display() {
        assert_eq!(ColonyId::from("kepler").to_string(), "colony:kepler");
    }
}
