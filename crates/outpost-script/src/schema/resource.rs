//! Resource definition schema

use outpost_core::ResourceId;
use serde::{Deserialize, Serialize};

/// Definition of a resource kind (e.g., credits, iron, energy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Kind name used in costs, rates and cargo
    pub id: ResourceId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Sale price per unit on transport delivery
    #[serde(default)]
    pub price: f64,
    /// Storage cap per colony; every kind the ledger tracks needs one
    #[serde(default)]
    pub cap: Option<f64>,
    /// Stock a new colony starts with
    #[serde(default)]
    pub starting: f64,
    /// Icon identifier for UI
    #[serde(default)]
    pub icon: Option<String>,
}

impl ResourceDef {
    /// Create a new resource definition with a cap
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>, cap: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price: 0.0,
            cap: Some(cap),
            starting: 0.0,
            icon: None,
        }
    }
}
