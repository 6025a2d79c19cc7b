//! Planet-surface coordinates and the placement grid

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the planet surface, in world units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f64,
    pub z: f64,
}

impl GridPosition {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Snap to the center of the nearest grid cell
    pub fn snapped(&self, grid_size: f64) -> Self {
        let cell = self.cell(grid_size);
        Self {
            x: cell.x as f64 * grid_size,
            z: cell.z as f64 * grid_size,
        }
    }

    /// The grid cell containing this position
    pub fn cell(&self, grid_size: f64) -> GridCell {
        GridCell {
            x: (self.x / grid_size).round() as i64,
            z: (self.z / grid_size).round() as i64,
        }
    }

    /// Euclidean distance in world units
    pub fn distance_to(&self, other: &GridPosition) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.z)
    }
}

/// Integer cell key; one building per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i64,
    pub z: i64,
}
