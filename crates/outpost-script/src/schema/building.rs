//! Building definition schema

use outpost_core::{BuildingTypeDef, DefId, PlacementRule, StatBlock};
use serde::{Deserialize, Serialize};

/// Definition of a building type as written in content files
///
/// Levels are implicit: `base` is level 1 and `upgrades[i]` is level `i + 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    /// Unique identifier for this building type
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Level 1 stats
    pub base: StatBlock,
    /// Stats for level 2 onwards, in order
    #[serde(default)]
    pub upgrades: Vec<StatBlock>,
    /// Placement restrictions, if any
    #[serde(default)]
    pub placement: Option<PlacementRule>,
}

impl BuildingDef {
    /// Highest level this definition describes
    pub fn max_level(&self) -> u32 {
        self.upgrades.len() as u32 + 1
    }

    /// Convert to the catalog's keyed-by-level form
    pub fn to_type_def(&self) -> BuildingTypeDef {
        self.upgrades.iter().cloned().fold(
            BuildingTypeDef::new(self.id.clone(), self.name.clone(), self.base.clone()),
            BuildingTypeDef::with_upgrade,
        )
    }
}
