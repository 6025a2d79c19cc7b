//! Colony configuration - starting stock, caps and transport tuning
//!
//! Catalog-wide settings (building cap, grid size) live in the
//! [`Catalog`](crate::Catalog); everything a single colony or scheduler needs
//! at construction time lives here.

use crate::{ResourceAmount, ResourceId};
use serde::{Deserialize, Serialize};

/// Configuration for a colony and its transport scheduler
///
/// # Example
///
/// ```
/// use outpost_core::{ColonyConfig, ResourceId};
///
/// let mut config = ColonyConfig::default();
/// assert_eq!(config.energy_resource, ResourceId::ENERGY);
///
/// // Delays are clamped to be non-negative
/// config.set_departure_delay(-3.0);
/// assert_eq!(config.departure_delay_seconds(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    /// Stock a new colony starts with
    pub starting_stock: ResourceAmount,
    /// Storage cap per resource kind; kinds without a cap are unknown to the ledger
    pub caps: ResourceAmount,
    /// Kind whose shortfall throttles all other production
    pub energy_resource: ResourceId,
    /// Kinds whose output scales down when workforce is short
    pub workforce_gated: Vec<ResourceId>,
    /// Kind credited by sales and debited by maintenance
    pub currency: ResourceId,
    /// Seconds between contract creation and departure
    departure_delay_seconds: f64,
    /// Shipping cost per cargo unit per distance unit, before the fuel multiplier
    base_rate_per_unit: f64,
}

impl ColonyConfig {
    /// Seconds between contract creation and departure
    pub fn departure_delay_seconds(&self) -> f64 {
        self.departure_delay_seconds
    }

    /// Set the departure delay, clamped to `>= 0`
    pub fn set_departure_delay(&mut self, seconds: f64) {
        self.departure_delay_seconds = clamp_non_negative(seconds);
    }

    /// Shipping cost basis
    pub fn base_rate_per_unit(&self) -> f64 {
        self.base_rate_per_unit
    }

    /// Set the shipping cost basis, clamped to `>= 0`
    pub fn set_base_rate_per_unit(&mut self, rate: f64) {
        self.base_rate_per_unit = clamp_non_negative(rate);
    }

    /// Builder-style starting stock
    pub fn with_starting_stock(mut self, stock: ResourceAmount) -> Self {
        self.starting_stock = stock;
        self
    }

    /// Builder-style caps
    pub fn with_caps(mut self, caps: ResourceAmount) -> Self {
        self.caps = caps;
        self
    }

    /// Re-apply clamping after deserialization
    pub fn normalized(mut self) -> Self {
        self.set_departure_delay(self.departure_delay_seconds);
        self.set_base_rate_per_unit(self.base_rate_per_unit);
        self
    }
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            starting_stock: ResourceAmount::new()
                .with(ResourceId::CREDITS, 1000.0)
                .with(ResourceId::IRON, 200.0)
                .with(ResourceId::ENERGY, 100.0)
                .with(ResourceId::CRYSTAL, 0.0)
                .with(ResourceId::RESEARCH, 0.0),
            caps: ResourceAmount::new()
                .with(ResourceId::CREDITS, 100_000.0)
                .with(ResourceId::IRON, 5000.0)
                .with(ResourceId::ENERGY, 2000.0)
                .with(ResourceId::CRYSTAL, 2000.0)
                .with(ResourceId::RESEARCH, 1000.0),
            energy_resource: ResourceId::ENERGY,
            workforce_gated: vec![ResourceId::RESEARCH],
            currency: ResourceId::CREDITS,
            departure_delay_seconds: 5.0,
            base_rate_per_unit: 0.1,
        }
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
