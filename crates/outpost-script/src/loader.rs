//! RON content loader

use crate::error::{Error, Result};
use crate::schema::{BuildingDef, ResourceDef, Settings};
use indexmap::IndexMap;
use outpost_core::{Catalog, ColonyConfig, DefId, ResourceAmount, ResourceId, ShipTypeDef};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One content file; every section is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentFile {
    settings: Option<Settings>,
    resources: Vec<ResourceDef>,
    ships: Vec<ShipTypeDef>,
    buildings: Vec<BuildingDef>,
}

/// Everything loaded from a set of content files
#[derive(Debug, Clone)]
pub struct Content {
    /// Read-only catalog of building types, rules, ships and prices
    pub catalog: Catalog,
    /// Starting stock, caps and transport settings for new colonies
    pub config: ColonyConfig,
    /// Resource definitions in load order
    pub resources: IndexMap<ResourceId, ResourceDef>,
}

/// Loader for RON content files
#[derive(Debug, Default)]
pub struct Loader {
    settings: Option<Settings>,
    resources: IndexMap<ResourceId, ResourceDef>,
    ships: IndexMap<DefId, ShipTypeDef>,
    buildings: IndexMap<DefId, BuildingDef>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading content file");
        self.load_str(&content)
    }

    /// Load content from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: ContentFile = ron::from_str(content)?;

        if let Some(settings) = file.settings {
            if self.settings.is_some() {
                return Err(Error::DuplicateDefinition("settings".to_string()));
            }
            self.settings = Some(settings);
        }
        for resource in file.resources {
            insert_unique(&mut self.resources, resource.id.clone(), resource)?;
        }
        for ship in file.ships {
            insert_unique(&mut self.ships, ship.id.clone(), ship)?;
        }
        for building in file.buildings {
            insert_unique(&mut self.buildings, building.id.clone(), building)?;
        }
        Ok(())
    }

    /// Load all RON files from a directory
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                // Recursively load subdirectories
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Validate everything loaded so far and build the catalog and config
    pub fn finish(self) -> Result<Content> {
        let settings = self.settings.unwrap_or_default();
        if !(settings.grid_size.is_finite() && settings.grid_size > 0.0) {
            return Err(Error::InvalidSchema(format!(
                "grid_size must be positive, got {}",
                settings.grid_size
            )));
        }

        let mut catalog = Catalog::new(settings.max_buildings, settings.grid_size);
        let mut config = ColonyConfig::default();
        settings.apply_to(&mut config);

        if !self.resources.is_empty() {
            let mut stock = ResourceAmount::new();
            let mut caps = ResourceAmount::new();
            for def in self.resources.values() {
                let cap = def
                    .cap
                    .ok_or_else(|| Error::MissingField(format!("cap of resource {}", def.id)))?;
                if def.starting < 0.0 || def.starting > cap {
                    return Err(Error::InvalidSchema(format!(
                        "starting stock {} of {} is outside [0, {}]",
                        def.starting, def.id, cap
                    )));
                }
                stock.set(def.id.clone(), def.starting);
                caps.set(def.id.clone(), cap);
                if def.price != 0.0 {
                    catalog = catalog.with_price(def.id.clone(), def.price);
                }
            }
            config = config.with_starting_stock(stock).with_caps(caps);
        }

        for ship in self.ships.into_values() {
            catalog = catalog.with_ship(ship);
        }

        for def in self.buildings.into_values() {
            if let Some(rule) = &def.placement {
                catalog = catalog.with_rule(def.id.clone(), rule.clone());
            }
            catalog = catalog.with_building(def.to_type_def());
        }

        catalog.validate()?;
        info!(
            buildings = catalog.building_types.len(),
            ships = catalog.ship_types.len(),
            resources = self.resources.len(),
            "content loaded"
        );
        Ok(Content {
            catalog,
            config,
            resources: self.resources,
        })
    }
}

fn insert_unique<K, V>(map: &mut IndexMap<K, V>, id: K, value: V) -> Result<()>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if map.contains_key(&id) {
        return Err(Error::DuplicateDefinition(id.to_string()));
    }
    map.insert(id, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
    (
        settings: Some((max_buildings: 10, grid_size: 2.0, base_rate_per_unit: Some(0.5))),
        resources: [
            (id: "credits", name: "Credits", cap: Some(1000.0), starting: 500.0),
            (id: "iron", name: "Iron", price: 2.0, cap: Some(100.0)),
        ],
        ships: [
            (id: "small", name: "Small", speed: 10.0, cargo_capacity: 50.0),
        ],
        buildings: [
            (
                id: "mine",
                name: "Mine",
                base: (cost: {"credits": 100.0}, production: {"iron": 5.0}),
                placement: Some((minimum_distance: 2.0)),
            ),
        ],
    )
    "#;

    #[test]
    fn test_load_content() {
        let mut loader = Loader::new();
        loader.load_str(SMALL).unwrap();
        let content = loader.finish().unwrap();

        assert_eq!(content.catalog.max_buildings, 10);
        assert_eq!(content.catalog.grid_size, 2.0);
        assert_eq!(content.catalog.price_of("iron"), 2.0);
        assert_eq!(content.catalog.ship_type(&DefId::new("small")).unwrap().fuel_multiplier, 1.0);
        assert!(content.catalog.placement_rule(&DefId::new("mine")).is_some());
        assert_eq!(content.config.starting_stock.get("credits"), 500.0);
        assert_eq!(content.config.caps.get("iron"), 100.0);
        assert!(!content.config.caps.contains("energy"));
        assert_eq!(content.config.base_rate_per_unit(), 0.5);
    }

    #[test]
    fn test_duplicate_definitions() {
        let mut loader = Loader::new();
        loader.load_str(SMALL).unwrap();
        let err = loader
            .load_str(r#"(ships: [(id: "small", name: "Again", speed: 1.0, cargo_capacity: 1.0)])"#)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(id) if id == "small"));

        let err = loader.load_str("(settings: Some((max_buildings: 5)))").unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(_)));
    }

    #[test]
    fn test_missing_cap() {
        let mut loader = Loader::new();
        loader
            .load_str(r#"(resources: [(id: "iron", name: "Iron")])"#)
            .unwrap();
        assert!(matches!(loader.finish(), Err(Error::MissingField(_))));
    }

    #[test]
    fn test_implicit_levels_and_ship_speed() {
        let mut loader = Loader::new();
        loader
            .load_str(
                r#"(buildings: [(
                    id: "mine",
                    name: "Mine",
                    base: (build_time_seconds: 1.0),
                    upgrades: [(build_time_seconds: 2.0), (build_time_seconds: 3.0)],
                )])"#,
            )
            .unwrap();
        let content = loader.finish().unwrap();
        assert_eq!(content.catalog.type_by_id(&DefId::new("mine")).unwrap().max_level, 3);

        let mut loader = Loader::new();
        loader
            .load_str(r#"(ships: [(id: "drifter", name: "Drifter", speed: 0.0, cargo_capacity: 1.0)])"#)
            .unwrap();
        assert!(matches!(
            loader.finish(),
            Err(Error::Core(outpost_core::Error::InvalidShipSpeed(_)))
        ));
    }

    #[test]
    fn test_bad_ron_is_a_parse_error() {
        let mut loader = Loader::new();
        assert!(matches!(loader.load_str("(buildings: [)"), Err(Error::Ron(_))));
    }
}
