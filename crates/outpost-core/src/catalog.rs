//! Static description of building types, placement rules, ship types and prices
//!
//! The catalog is built once (in code or by `outpost-script` from RON files)
//! and then shared read-only, usually behind an `Arc`. Every lookup is keyed
//! directly by ID.

use crate::error::{Error, Result};
use crate::{DefId, ResourceAmount, ResourceId, ResourceRates};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Non-production effects of a building at one level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingEffects {
    /// Colonists housed
    pub population: f64,
    /// Workers supplied
    pub workforce: f64,
    /// Colony-wide multiplier on credits production (absent = 1)
    pub credits_bonus: Option<f64>,
    /// Sensor radius in world units
    pub scan_range: f64,
    /// Fractional speed-up of all construction (0.25 = 25% faster)
    pub build_speed_bonus: f64,
    /// Transport ships this terminal can dispatch at once
    pub ship_capacity: u32,
    /// Cargo units this terminal can buffer
    pub storage_capacity: f64,
    /// Units per second moved from the buffer into colony stock, per kind
    pub transfer_speed: f64,
}

impl BuildingEffects {
    /// Whether these effects make the building a transport terminal
    pub fn is_terminal(&self) -> bool {
        self.ship_capacity > 0 || self.storage_capacity > 0.0 || self.transfer_speed > 0.0
    }
}

/// Weapon stats for defensive buildings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    pub damage: f64,
    pub range: f64,
    pub fire_rate: f64,
}

/// Stats of a building type at one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    /// Cost to build (level 1) or to upgrade into this level
    pub cost: ResourceAmount,
    /// Construction time before speed bonuses
    pub build_time_seconds: f64,
    /// Output per minute
    pub production: ResourceRates,
    /// Energy drawn per minute
    pub energy_consumption: f64,
    pub effects: BuildingEffects,
    pub combat: CombatStats,
    /// Workers needed to run at full output
    pub workforce_required: f64,
    /// Upkeep per minute
    pub maintenance: ResourceAmount,
    /// Production multiplier when a resource node is attached
    pub resource_node_bonus: f64,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            cost: ResourceAmount::new(),
            build_time_seconds: 0.0,
            production: ResourceRates::new(),
            energy_consumption: 0.0,
            effects: BuildingEffects::default(),
            combat: CombatStats::default(),
            workforce_required: 0.0,
            maintenance: ResourceAmount::new(),
            resource_node_bonus: 1.0,
        }
    }
}

/// Definition of a building type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTypeDef {
    /// Unique identifier
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Highest reachable level (levels are 1..=max_level)
    pub max_level: u32,
    /// Level 1 stats
    pub base_stats: StatBlock,
    /// Stats for levels 2..=max_level
    #[serde(default)]
    pub upgrades: IndexMap<u32, StatBlock>,
}

impl BuildingTypeDef {
    /// Create a single-level building type
    pub fn new(id: impl Into<DefId>, name: impl Into<String>, base_stats: StatBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_level: 1,
            base_stats,
            upgrades: IndexMap::new(),
        }
    }

    /// Add the stats for the next level
    pub fn with_upgrade(mut self, stats: StatBlock) -> Self {
        self.max_level += 1;
        self.upgrades.insert(self.max_level, stats);
        self
    }

    /// Stats at `level`
    pub fn stats(&self, level: u32) -> Result<&StatBlock> {
        match level {
            1 => Ok(&self.base_stats),
            l if l > self.max_level => Err(self.unknown_level(l)),
            l => self.upgrades.get(&l).ok_or_else(|| self.unknown_level(l)),
        }
    }

    /// Whether any level of this type acts as a transport terminal
    pub fn is_terminal(&self) -> bool {
        self.base_stats.effects.is_terminal()
            || self.upgrades.values().any(|s| s.effects.is_terminal())
    }

    fn unknown_level(&self, level: u32) -> Error {
        Error::UnknownLevel {
            type_id: self.id.clone(),
            level,
        }
    }
}

/// Proximity requirement for a resource node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRequirement {
    /// Kind of node to look for
    pub kind: ResourceId,
    /// Search radius in grid units
    pub range: f64,
}

/// Placement restrictions for one building type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRule {
    /// Maximum number of this type on one planet
    pub max_per_planet: Option<usize>,
    /// Minimum spacing to other buildings of the same type, in grid units
    pub minimum_distance: f64,
    /// Node this type draws from, if any
    pub requires_resource_node: Option<NodeRequirement>,
    /// Whether the surface must report the cell as open
    pub requires_open_space: bool,
}

/// Definition of a transport ship type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTypeDef {
    pub id: DefId,
    pub name: String,
    /// Travel speed in distance units per second
    pub speed: f64,
    /// Multiplier on the per-unit shipping rate
    #[serde(default = "default_fuel_multiplier")]
    pub fuel_multiplier: f64,
    /// Maximum cargo units per trip
    pub cargo_capacity: f64,
}

impl ShipTypeDef {
    /// Whether the ship actually moves; a stationary ship would arrive instantly
    pub fn has_valid_speed(&self) -> bool {
        self.speed.is_finite() && self.speed > 0.0
    }
}

fn default_fuel_multiplier() -> f64 {
    1.0
}

/// Default building cap per colony
pub const DEFAULT_MAX_BUILDINGS: usize = 50;

/// Default grid cell size in world units
pub const DEFAULT_GRID_SIZE: f64 = 1.0;

/// The complete, read-only content catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Building types by ID
    #[serde(default)]
    pub building_types: IndexMap<DefId, BuildingTypeDef>,
    /// Placement rules by building type ID
    #[serde(default)]
    pub placement_rules: IndexMap<DefId, PlacementRule>,
    /// Ship types by ID
    #[serde(default)]
    pub ship_types: IndexMap<DefId, ShipTypeDef>,
    /// Sale price per unit, by resource kind
    #[serde(default)]
    pub prices: ResourceAmount,
    /// Building cap per colony
    #[serde(default = "default_max_buildings")]
    pub max_buildings: usize,
    /// Placement grid cell size in world units
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_max_buildings() -> usize {
    DEFAULT_MAX_BUILDINGS
}

fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(max_buildings: usize, grid_size: f64) -> Self {
        Self {
            building_types: IndexMap::new(),
            placement_rules: IndexMap::new(),
            ship_types: IndexMap::new(),
            prices: ResourceAmount::new(),
            max_buildings,
            grid_size: if grid_size > 0.0 {
                grid_size
            } else {
                DEFAULT_GRID_SIZE
            },
        }
    }

    /// Add a building type
    pub fn with_building(mut self, def: BuildingTypeDef) -> Self {
        self.building_types.insert(def.id.clone(), def);
        self
    }

    /// Add a placement rule
    pub fn with_rule(mut self, type_id: impl Into<DefId>, rule: PlacementRule) -> Self {
        self.placement_rules.insert(type_id.into(), rule);
        self
    }

    /// Add a ship type
    pub fn with_ship(mut self, def: ShipTypeDef) -> Self {
        self.ship_types.insert(def.id.clone(), def);
        self
    }

    /// Set a sale price
    pub fn with_price(mut self, kind: impl Into<ResourceId>, price: f64) -> Self {
        self.prices.set(kind, price);
        self
    }

    /// Look up a building type
    pub fn type_by_id(&self, id: &DefId) -> Result<&BuildingTypeDef> {
        self.building_types
            .get(id)
            .ok_or_else(|| Error::UnknownBuildingType(id.clone()))
    }

    /// Stats of a building type at a level
    pub fn stats_for(&self, type_id: &DefId, level: u32) -> Result<&StatBlock> {
        self.type_by_id(type_id)?.stats(level)
    }

    /// Placement rule of a type, if it has one
    pub fn placement_rule(&self, type_id: &DefId) -> Option<&PlacementRule> {
        self.placement_rules.get(type_id)
    }

    /// Look up a ship type
    pub fn ship_type(&self, id: &DefId) -> Result<&ShipTypeDef> {
        self.ship_types
            .get(id)
            .ok_or_else(|| Error::UnknownShipType(id.clone()))
    }

    /// Sale price of one unit (0 when unlisted)
    pub fn price_of(&self, kind: &str) -> f64 {
        self.prices.get(kind)
    }

    /// Check that every type has stats for each of its levels, every rule
    /// names a known type and every ship moves
    pub fn validate(&self) -> Result<()> {
        for def in self.building_types.values() {
            for level in 1..=def.max_level {
                def.stats(level)?;
            }
        }
        if let Some(type_id) = self
            .placement_rules
            .keys()
            .find(|id| !self.building_types.contains_key(*id))
        {
            return Err(Error::UnknownBuildingType(type_id.clone()));
        }
        if let Some(ship) = self.ship_types.values().find(|s| !s.has_valid_speed()) {
            return Err(Error::InvalidShipSpeed(ship.id.clone()));
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUILDINGS, DEFAULT_GRID_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine() -> BuildingTypeDef {
        BuildingTypeDef::new(
            "mine",
            "Mine",
            StatBlock {
                production: ResourceRates::new().with(ResourceId::IRON, 5.0),
                energy_consumption: 3.0,
                ..StatBlock::default()
            },
        )
        .with_upgrade(StatBlock {
            cost: ResourceAmount::new().with(ResourceId::CREDITS, 150.0),
            production: ResourceRates::new().with(ResourceId::IRON, 8.0),
            ..StatBlock::default()
        })
    }

    #[test]
    fn test_stats_for_levels() {
        let catalog = Catalog::default().with_building(mine());
        let id = DefId::new("mine");

        assert_eq!(catalog.stats_for(&id, 1).unwrap().production.get("iron"), 5.0);
        assert_eq!(catalog.stats_for(&id, 2).unwrap().production.get("iron"), 8.0);
        assert!(matches!(
            catalog.stats_for(&id, 3),
            Err(Error::UnknownLevel { level: 3, .. })
        ));
        assert!(matches!(
            catalog.stats_for(&id, 0),
            Err(Error::UnknownLevel { level: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        let catalog = Catalog::default();
        assert!(matches!(
            catalog.type_by_id(&DefId::new("nope")),
            Err(Error::UnknownBuildingType(_))
        ));
        assert!(catalog.placement_rule(&DefId::new("nope")).is_none());
    }

    #[test]
    fn test_validate_catches_missing_upgrade() {
        let mut def = mine();
        def.max_level = 3;
        let catalog = Catalog::default().with_building(def);
        assert!(matches!(
            catalog.validate(),
            Err(Error::UnknownLevel { level: 3, .. })
        ));
    }

    #[test]
    fn test_validate_catches_orphan_rule() {
        let catalog = Catalog::default().with_rule("ghost", PlacementRule::default());
        assert!(matches!(
            catalog.validate(),
            Err(Error::UnknownBuildingType(_))
        ));
    }

    #[test]
    fn test_validate_catches_stationary_ship() {
        for speed in [0.0, -4.0, f64::NAN] {
            let catalog = Catalog::default().with_ship(ShipTypeDef {
                id: DefId::new("drifter"),
                name: "Drifter".into(),
                speed,
                fuel_multiplier: 1.0,
                cargo_capacity: 10.0,
            });
            assert!(matches!(
                catalog.validate(),
                Err(Error::InvalidShipSpeed(id)) if id == DefId::new("drifter")
            ));
        }
    }

    #[test]
    fn test_terminal_detection() {
        let port = BuildingTypeDef::new(
            "spaceport",
            "Spaceport",
            StatBlock {
                effects: BuildingEffects {
                    ship_capacity: 2,
                    ..BuildingEffects::default()
                },
                ..StatBlock::default()
            },
        );
        assert!(port.is_terminal());
        assert!(!mine().is_terminal());
    }

    #[test]
    fn test_prices_default_to_zero() {
        let catalog = Catalog::default().with_price(ResourceId::IRON, 2.0);
        assert_eq!(catalog.price_of("iron"), 2.0);
        assert_eq!(catalog.price_of("crystal"), 0.0);
    }

    #[test]
    fn test_stat_block_ron_defaults() {
        let stats: StatBlock = ron::from_str(
            r#"(
                cost: {"credits": 100.0},
                production: {"iron": 5.0},
                energy_consumption: 3.0,
            )"#,
        )
        .unwrap();
        assert_eq!(stats.resource_node_bonus, 1.0);
        assert_eq!(stats.effects.credits_bonus, None);
        assert_eq!(stats.cost.get("credits"), 100.0);
    }
}
