//! The planet surface as seen by building placement
//!
//! Resource nodes and terrain belong to the surface, not to the colony.
//! Buildings only remember a node's ID and its distance at placement time.

use crate::{GridPosition, NodeId, ResourceId};
use serde::{Deserialize, Serialize};

/// A resource deposit on the surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: NodeId,
    pub position: GridPosition,
    pub kind: ResourceId,
}

/// Spatial queries used during placement
pub trait Surface {
    /// The node of `kind` closest to `position`, if any
    fn nearest_node(&self, position: GridPosition, kind: &ResourceId) -> Option<ResourceNode>;

    /// Whether `position` is free of terrain obstacles
    fn is_open_space(&self, _position: GridPosition) -> bool {
        true
    }
}

/// A surface with no nodes and no obstacles
#[derive(Debug, Clone, Copy, Default)]
pub struct BareSurface;

impl Surface for BareSurface {
    fn nearest_node(&self, _position: GridPosition, _kind: &ResourceId) -> Option<ResourceNode> {
        None
    }
}

/// A circular obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: GridPosition,
    pub radius: f64,
}

/// A surface described by explicit node and obstacle lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeField {
    nodes: Vec<ResourceNode>,
    obstacles: Vec<Obstacle>,
    next_node: u64,
}

impl NodeField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its ID
    pub fn add_node(&mut self, kind: impl Into<ResourceId>, position: GridPosition) -> NodeId {
        self.next_node += 1;
        let id = NodeId::new(self.next_node);
        self.nodes.push(ResourceNode {
            id,
            position,
            kind: kind.into(),
        });
        id
    }

    /// Remove a depleted node; buildings that referenced it keep only a stale ID
    pub fn remove_node(&mut self, id: NodeId) -> Option<ResourceNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        Some(self.nodes.remove(index))
    }

    /// Block a circular area
    pub fn add_obstacle(&mut self, center: GridPosition, radius: f64) {
        self.obstacles.push(Obstacle { center, radius });
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }
}

impl Surface for NodeField {
    fn nearest_node(&self, position: GridPosition, kind: &ResourceId) -> Option<ResourceNode> {
        self.nodes
            .iter()
            .filter(|n| &n.kind == kind)
            .min_by(|a, b| {
                let da = a.position.distance_to(&position);
                let db = b.position.distance_to(&position);
                da.total_cmp(&db)
            })
            .cloned()
    }

    fn is_open_space(&self, position: GridPosition) -> bool {
        self.obstacles
            .iter()
            .all(|o| o.center.distance_to(&position) > o.radius)
    }
}
