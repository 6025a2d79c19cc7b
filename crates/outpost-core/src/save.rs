//! Colony saves in RON or bincode
//!
//! A save holds only durable state: the building list and the ledger's stock
//! and caps. Rates are recomputed on restore and next IDs continue after the
//! highest saved building ID.

use crate::catalog::Catalog;
use crate::colony::Colony;
use crate::error::{Error, Result};
use crate::ledger::ResourceLedger;
use crate::registry::{Building, BuildingRegistry};
use crate::time::SimTime;
use crate::{ColonyConfig, ColonyId, ResourceAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Persisted state of one colony
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonySave {
    pub version: u32,
    /// Wall-clock time the save was taken
    pub saved_at: DateTime<Utc>,
    /// Simulated time the save was taken
    pub sim_time: SimTime,
    pub colony: ColonyId,
    pub buildings: Vec<Building>,
    pub stock: ResourceAmount,
    pub caps: ResourceAmount,
}

impl ColonySave {
    /// Capture a colony's durable state
    pub fn capture(colony: &Colony) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            sim_time: colony.now(),
            colony: colony.id().clone(),
            buildings: colony.buildings_snapshot(),
            stock: colony.ledger().stock(),
            caps: colony.ledger().caps(),
        }
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a RON save
    pub fn from_ron(content: &str) -> Result<Self> {
        let save: Self = ron::from_str(content).map_err(|e| Error::Serialization(e.to_string()))?;
        save.check_version()
    }

    /// Serialize to bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse a bincode save
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let save: Self =
            bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        save.check_version()
    }

    fn check_version(self) -> Result<Self> {
        if self.version > SAVE_VERSION {
            return Err(Error::Serialization(format!(
                "save version {} is newer than supported version {}",
                self.version, SAVE_VERSION
            )));
        }
        Ok(self)
    }

    /// Rebuild the colony against `catalog`
    ///
    /// A building whose type the catalog does not define, or whose level the
    /// type does not have, means the save and catalog disagree; the restore
    /// fails instead of repairing the data.
    pub fn restore(self, catalog: Arc<Catalog>, config: &ColonyConfig) -> Result<Colony> {
        for building in &self.buildings {
            catalog.stats_for(&building.type_id, building.level)?;
        }

        let registry = BuildingRegistry::restore(&catalog, self.buildings);
        let ledger = ResourceLedger::from_parts(self.stock, self.caps, config);
        info!(
            colony = %self.colony,
            buildings = registry.len(),
            saved_at = %self.saved_at,
            "colony restored"
        );
        Colony::from_parts(self.colony, catalog, ledger, registry, self.sim_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingTypeDef, StatBlock};
    use crate::grid::GridPosition;
    use crate::registry::BuildingState;
    use crate::{BuildingId, DefId, ResourceId};

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::default()
                .with_building(BuildingTypeDef::new(
                    "power_plant",
                    "Power Plant",
                    StatBlock {
                        build_time_seconds: 10.0,
                        production: ResourceAmount::new().with(ResourceId::ENERGY, 6.0),
                        ..StatBlock::default()
                    },
                ))
                .with_building(BuildingTypeDef::new(
                    "habitat",
                    "Habitat",
                    StatBlock {
                        build_time_seconds: 100.0,
                        ..StatBlock::default()
                    },
                )),
        )
    }

    fn colony() -> Colony {
        let config = ColonyConfig::default();
        let mut colony = Colony::new("home", catalog(), &config, 0.0);
        colony
            .place(&DefId::new("power_plant"), GridPosition::new(0.0, 0.0))
            .unwrap();
        colony
            .place(&DefId::new("habitat"), GridPosition::new(3.0, 0.0))
            .unwrap();
        colony.tick(30.0).unwrap();
        colony
    }

    #[test]
    fn test_ron_round_trip() {
        let colony = colony();
        let save = ColonySave::capture(&colony);
        let text = save.to_ron().unwrap();
        let loaded = ColonySave::from_ron(&text).unwrap();
        assert_eq!(loaded, save);

        let restored = loaded.restore(catalog(), &ColonyConfig::default()).unwrap();
        assert_eq!(restored.buildings_snapshot(), colony.buildings_snapshot());
        assert_eq!(restored.stock(), colony.stock());
        assert_eq!(restored.rates().production.get("energy"), 6.0);
        assert_eq!(restored.registry().next_id(), BuildingId::new(3));
    }

    #[test]
    fn test_bincode_round_trip_keeps_construction_state() {
        let colony = colony();
        let bytes = ColonySave::capture(&colony).to_bytes().unwrap();
        let restored = ColonySave::from_bytes(&bytes)
            .unwrap()
            .restore(catalog(), &ColonyConfig::default())
            .unwrap();

        let habitat = restored.registry().get(BuildingId::new(2)).unwrap();
        assert_eq!(habitat.state, BuildingState::Constructing);
        assert_eq!(habitat.construction_duration, 100.0);
        assert_eq!(restored.now(), 30.0);
    }

    #[test]
    fn test_unknown_type_fails_restore() {
        let mut save = ColonySave::capture(&colony());
        save.buildings[0].type_id = DefId::new("ghost");
        let err = save.restore(catalog(), &ColonyConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownBuildingType(id) if id == DefId::new("ghost")));
    }

    #[test]
    fn test_unknown_level_fails_restore() {
        let mut save = ColonySave::capture(&colony());
        save.buildings[1].level = 4;
        let err = save.restore(catalog(), &ColonyConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownLevel { level: 4, .. }));

        let mut save = ColonySave::capture(&colony());
        save.buildings[0].level = 0;
        assert!(matches!(
            save.restore(catalog(), &ColonyConfig::default()),
            Err(Error::UnknownLevel { level: 0, .. })
        ));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut save = ColonySave::capture(&colony());
        save.version = SAVE_VERSION + 1;
        let text = save.to_ron().unwrap();
        assert!(matches!(
            ColonySave::from_ron(&text),
            Err(Error::Serialization(_))
        ));
    }
}
