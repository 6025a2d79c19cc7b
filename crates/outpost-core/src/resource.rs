//! Resource kinds and resource amount maps

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::ops::Deref;

/// A resource kind (credits, iron, energy, ...)
///
/// The set of kinds is open: content files may introduce new kinds by name.
/// The well-known kinds are available as associated constants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Cow<'static, str>);

impl ResourceId {
    pub const CREDITS: ResourceId = ResourceId(Cow::Borrowed("credits"));
    pub const IRON: ResourceId = ResourceId(Cow::Borrowed("iron"));
    pub const ENERGY: ResourceId = ResourceId(Cow::Borrowed("energy"));
    pub const CRYSTAL: ResourceId = ResourceId(Cow::Borrowed("crystal"));
    pub const RESEARCH: ResourceId = ResourceId(Cow::Borrowed("research"));

    /// Create a resource kind from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Get the kind name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for ResourceId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A quantity per resource kind
///
/// Used for stock, caps, costs, cargo and (per minute) rates. Keeps insertion
/// order so serialized output and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAmount(IndexMap<ResourceId, f64>);

/// Per-minute rates keyed by resource kind
pub type ResourceRates = ResourceAmount;

impl ResourceAmount {
    /// Create an empty amount
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, kind: impl Into<ResourceId>, amount: f64) -> Self {
        self.set(kind, amount);
        self
    }

    /// Amount for a kind (0 if absent)
    pub fn get(&self, kind: &str) -> f64 {
        self.0.get(kind).copied().unwrap_or(0.0)
    }

    /// Whether the kind has an entry (even a zero one)
    pub fn contains(&self, kind: &str) -> bool {
        self.0.contains_key(kind)
    }

    /// Set the amount for a kind
    pub fn set(&mut self, kind: impl Into<ResourceId>, amount: f64) {
        self.0.insert(kind.into(), amount);
    }

    /// Add a delta to a kind, creating the entry if needed
    pub fn add(&mut self, kind: impl Into<ResourceId>, delta: f64) {
        *self.0.entry(kind.into()).or_insert(0.0) += delta;
    }

    /// Add every entry of another amount into this one
    pub fn merge(&mut self, other: &ResourceAmount) {
        for (kind, amount) in other.iter() {
            self.add(kind.clone(), amount);
        }
    }

    /// Iterate over (kind, amount)
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// Iterate over kinds
    pub fn kinds(&self) -> impl Iterator<Item = &ResourceId> {
        self.0.keys()
    }

    /// Sum of all amounts
    pub fn total_units(&self) -> f64 {
        self.0.values().sum()
    }

    /// Number of kinds present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no kinds are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<ResourceId>> FromIterator<(K, f64)> for ResourceAmount {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for ResourceAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {:.1}", k, v)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
