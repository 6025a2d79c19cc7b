//! Catalog-wide and colony-wide settings schema

use outpost_core::{ColonyConfig, ResourceId, DEFAULT_GRID_SIZE, DEFAULT_MAX_BUILDINGS};
use serde::{Deserialize, Serialize};

/// Settings block of a content file
///
/// Unset colony fields keep the [`ColonyConfig`] defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Building cap per colony
    pub max_buildings: usize,
    /// Placement grid cell size in world units
    pub grid_size: f64,
    pub energy_resource: Option<ResourceId>,
    pub workforce_gated: Option<Vec<ResourceId>>,
    pub currency: Option<ResourceId>,
    pub departure_delay_seconds: Option<f64>,
    pub base_rate_per_unit: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_buildings: DEFAULT_MAX_BUILDINGS,
            grid_size: DEFAULT_GRID_SIZE,
            energy_resource: None,
            workforce_gated: None,
            currency: None,
            departure_delay_seconds: None,
            base_rate_per_unit: None,
        }
    }
}

impl Settings {
    /// Write the colony-level settings that are present into `config`
    pub fn apply_to(&self, config: &mut ColonyConfig) {
        if let Some(kind) = &self.energy_resource {
            config.energy_resource = kind.clone();
        }
        if let Some(kinds) = &self.workforce_gated {
            config.workforce_gated = kinds.clone();
        }
        if let Some(kind) = &self.currency {
            config.currency = kind.clone();
        }
        if let Some(delay) = self.departure_delay_seconds {
            config.set_departure_delay(delay);
        }
        if let Some(rate) = self.base_rate_per_unit {
            config.set_base_rate_per_unit(rate);
        }
    }
}
