//! Building registry - placed buildings, their grid cells and lifecycle
//!
//! The registry is the sole owner of [`Building`] values. Other components
//! keep [`BuildingId`]s and look buildings up again when they need them.
//!
//! Lifecycle per building:
//!
//! ```text
//! place() ──> Constructing ──(update: elapsed >= duration)──> Idle
//!                  ^                                           │
//!                  └──────────────── upgrade() ────────────────┘
//! ```
//!
//! `remove()` deletes the building outright and refunds nothing.

use crate::catalog::Catalog;
use crate::error::{Error, Rejection, Result};
use crate::event::{Event, EventKind, EventQueue};
use crate::grid::{GridCell, GridPosition};
use crate::ledger::ResourceLedger;
use crate::surface::Surface;
use crate::time::SimTime;
use crate::{BuildingId, DefId, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Construction state of a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingState {
    /// Being built or upgraded; contributes nothing
    Constructing,
    /// Operating
    Idle,
}

/// Weak link to a resource node owned by the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLink {
    pub node: NodeId,
    /// Distance at placement time, in world units
    pub distance: f64,
}

/// A placed building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub type_id: DefId,
    /// Snapped world position
    pub position: GridPosition,
    pub level: u32,
    pub state: BuildingState,
    pub construction_start: SimTime,
    pub construction_duration: f64,
    pub nearby_node: Option<NodeLink>,
}

impl Building {
    /// Whether the building is under construction or upgrade
    pub fn is_constructing(&self) -> bool {
        self.state == BuildingState::Constructing
    }

    /// Simulated time at which construction finishes
    pub fn completes_at(&self) -> SimTime {
        self.construction_start + self.construction_duration
    }

    /// Construction progress in `[0, 1]` (1 when idle)
    pub fn progress(&self, now: SimTime) -> f64 {
        if !self.is_constructing() || self.construction_duration <= 0.0 {
            return 1.0;
        }
        ((now - self.construction_start) / self.construction_duration).clamp(0.0, 1.0)
    }
}

/// All buildings of one colony, indexed by ID, grid cell and type
#[derive(Debug, Clone)]
pub struct BuildingRegistry {
    buildings: IndexMap<BuildingId, Building>,
    by_cell: HashMap<GridCell, BuildingId>,
    by_type: IndexMap<DefId, Vec<BuildingId>>,
    grid_size: f64,
    next_id: u64,
    events: EventQueue,
}

impl BuildingRegistry {
    /// Create an empty registry using the catalog's grid size
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            buildings: IndexMap::new(),
            by_cell: HashMap::new(),
            by_type: IndexMap::new(),
            grid_size: catalog.grid_size,
            next_id: 1,
            events: EventQueue::new(),
        }
    }

    /// Rebuild a registry from persisted buildings
    ///
    /// The next ID continues after the highest restored ID. A building whose
    /// ID or cell is already taken by an earlier one is dropped.
    pub fn restore(catalog: &Catalog, buildings: impl IntoIterator<Item = Building>) -> Self {
        let mut registry = Self::new(catalog);
        for mut building in buildings {
            building.position = building.position.snapped(registry.grid_size);
            if registry.buildings.contains_key(&building.id) {
                warn!(building = %building.id, "dropping restored building with a duplicate id");
                continue;
            }
            let cell = building.position.cell(registry.grid_size);
            if let Some(existing) = registry.by_cell.get(&cell) {
                warn!(
                    building = %building.id,
                    occupant = %existing,
                    "dropping restored building on an occupied cell"
                );
                continue;
            }
            registry.next_id = registry.next_id.max(building.id.raw() + 1);
            registry.insert(building);
        }
        registry
    }

    fn insert(&mut self, building: Building) {
        let cell = building.position.cell(self.grid_size);
        self.by_cell.insert(cell, building.id);
        self.by_type
            .entry(building.type_id.clone())
            .or_default()
            .push(building.id);
        self.buildings.insert(building.id, building);
    }

    /// Get a building by ID
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Building occupying the cell containing `position`
    pub fn at(&self, position: GridPosition) -> Option<&Building> {
        self.by_cell
            .get(&position.cell(self.grid_size))
            .and_then(|id| self.buildings.get(id))
    }

    /// Iterate over all buildings in placement order
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Owned copies of all buildings, for UI collaborators
    pub fn snapshot(&self) -> Vec<Building> {
        self.buildings.values().cloned().collect()
    }

    /// All buildings of a type
    pub fn by_type(&self, type_id: &DefId) -> impl Iterator<Item = &Building> {
        self.by_type
            .get(type_id)
            .into_iter()
            .flat_map(|ids| ids.iter().filter_map(|id| self.buildings.get(id)))
    }

    /// Number of buildings of a type
    pub fn count_of(&self, type_id: &DefId) -> usize {
        self.by_type.get(type_id).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// ID the next placed building will get
    pub fn next_id(&self) -> BuildingId {
        BuildingId::new(self.next_id)
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Construction time divisor from completed buildings' speed bonuses
    pub fn build_speed_factor(&self, catalog: &Catalog) -> Result<f64> {
        let mut bonus = 0.0;
        for building in self.iter().filter(|b| !b.is_constructing()) {
            bonus += catalog
                .stats_for(&building.type_id, building.level)?
                .effects
                .build_speed_bonus;
        }
        Ok((1.0 + bonus).max(f64::EPSILON))
    }

    /// Check every placement rule without changing anything
    ///
    /// Returns `Err(Error::Rejected(..))` for an expected refusal and
    /// `Err(Error::UnknownBuildingType)` for a type the catalog lacks.
    pub fn check_placement(
        &self,
        catalog: &Catalog,
        ledger: &ResourceLedger,
        surface: &dyn Surface,
        type_id: &DefId,
        position: GridPosition,
    ) -> Result<()> {
        let def = catalog.type_by_id(type_id)?;
        let position = position.snapped(self.grid_size);

        if let Some(occupant) = self.by_cell.get(&position.cell(self.grid_size)) {
            return Err(Rejection::CellOccupied(*occupant).into());
        }
        if self.len() >= catalog.max_buildings {
            return Err(Rejection::BuildingCapReached(catalog.max_buildings).into());
        }

        if let Some(rule) = catalog.placement_rule(type_id) {
            if let Some(limit) = rule.max_per_planet {
                if self.count_of(type_id) >= limit {
                    return Err(Rejection::TypeLimitReached {
                        type_id: type_id.clone(),
                        limit,
                    }
                    .into());
                }
            }
            if rule.minimum_distance > 0.0 {
                let min = rule.minimum_distance * self.grid_size;
                if let Some(near) = self
                    .by_type(type_id)
                    .find(|b| b.position.distance_to(&position) < min)
                {
                    return Err(Rejection::TooClose(near.id).into());
                }
            }
            if rule.requires_open_space && !surface.is_open_space(position) {
                return Err(Rejection::NoOpenSpace.into());
            }
        }

        if !ledger.has_sufficient(&def.base_stats.cost) {
            return Err(Rejection::InsufficientResources.into());
        }
        Ok(())
    }

    /// Whether `type_id` could be placed at `position` right now
    pub fn can_place(
        &self,
        catalog: &Catalog,
        ledger: &ResourceLedger,
        surface: &dyn Surface,
        type_id: &DefId,
        position: GridPosition,
    ) -> bool {
        self.check_placement(catalog, ledger, surface, type_id, position)
            .is_ok()
    }

    /// Place a building: validate, pay, and start construction
    ///
    /// Validation is repeated here even if the caller probed with
    /// [`can_place`](Self::can_place), and the spend itself is the final gate.
    pub fn place(
        &mut self,
        catalog: &Catalog,
        ledger: &mut ResourceLedger,
        surface: &dyn Surface,
        type_id: &DefId,
        position: GridPosition,
        now: SimTime,
    ) -> Result<Building> {
        self.check_placement(catalog, ledger, surface, type_id, position)?;
        let def = catalog.type_by_id(type_id)?;
        let duration = def.base_stats.build_time_seconds / self.build_speed_factor(catalog)?;

        ledger.mark_time(now);
        if !ledger.spend(&def.base_stats.cost) {
            return Err(Rejection::InsufficientResources.into());
        }

        let position = position.snapped(self.grid_size);
        let nearby_node = catalog
            .placement_rule(type_id)
            .and_then(|rule| rule.requires_resource_node.as_ref())
            .and_then(|req| {
                let node = surface.nearest_node(position, &req.kind)?;
                let distance = node.position.distance_to(&position);
                (distance <= req.range * self.grid_size).then_some(NodeLink {
                    node: node.id,
                    distance,
                })
            });

        let building = Building {
            id: BuildingId::new(self.next_id),
            type_id: type_id.clone(),
            position,
            level: 1,
            state: BuildingState::Constructing,
            construction_start: now,
            construction_duration: duration,
            nearby_node,
        };
        self.next_id += 1;

        info!(
            building = %building.id,
            type_id = %type_id,
            position = %position,
            duration,
            "building placed"
        );
        self.events.push(
            now,
            EventKind::BuildingPlaced {
                building: building.id,
                type_id: type_id.clone(),
            },
        );
        self.insert(building.clone());
        Ok(building)
    }

    /// Start upgrading a building to its next level
    pub fn upgrade(
        &mut self,
        catalog: &Catalog,
        ledger: &mut ResourceLedger,
        id: BuildingId,
        now: SimTime,
    ) -> Result<()> {
        let building = self.get(id).ok_or(Rejection::NotFound(id))?;
        if building.is_constructing() {
            return Err(Rejection::UnderConstruction(id).into());
        }
        let def = catalog.type_by_id(&building.type_id)?;
        if building.level >= def.max_level {
            return Err(Rejection::MaxLevelReached(id).into());
        }
        let next_level = building.level + 1;
        let next = def.stats(next_level)?;
        let duration = next.build_time_seconds / self.build_speed_factor(catalog)?;

        ledger.mark_time(now);
        if !ledger.spend(&next.cost) {
            return Err(Rejection::InsufficientResources.into());
        }

        let building = self
            .buildings
            .get_mut(&id)
            .ok_or(Error::Rejected(Rejection::NotFound(id)))?;
        building.level = next_level;
        building.state = BuildingState::Constructing;
        building.construction_start = now;
        building.construction_duration = duration;

        info!(building = %id, level = next_level, duration, "upgrade started");
        self.events.push(
            now,
            EventKind::UpgradeStarted {
                building: id,
                type_id: def.id.clone(),
                level: next_level,
            },
        );
        Ok(())
    }

    /// Remove a building from every index
    pub fn remove(&mut self, id: BuildingId, now: SimTime) -> Result<Building> {
        let building = self
            .buildings
            .shift_remove(&id)
            .ok_or(Rejection::NotFound(id))?;
        self.by_cell.remove(&building.position.cell(self.grid_size));
        if let Some(ids) = self.by_type.get_mut(&building.type_id) {
            ids.retain(|&bid| bid != id);
        }

        info!(building = %id, type_id = %building.type_id, "building removed");
        self.events.push(
            now,
            EventKind::BuildingRemoved {
                building: id,
                type_id: building.type_id.clone(),
            },
        );
        Ok(building)
    }

    /// Finish every construction whose deadline has passed
    ///
    /// This is the only place a building leaves `Constructing`. Returns the
    /// IDs that completed, in placement order.
    pub fn update(&mut self, now: SimTime) -> Vec<BuildingId> {
        let mut completed = Vec::new();
        for building in self.buildings.values_mut() {
            if !building.is_constructing() || now < building.completes_at() {
                continue;
            }
            building.state = BuildingState::Idle;
            completed.push(building.id);

            let kind = if building.level == 1 {
                EventKind::BuildingBuilt {
                    building: building.id,
                    type_id: building.type_id.clone(),
                }
            } else {
                EventKind::BuildingUpgraded {
                    building: building.id,
                    type_id: building.type_id.clone(),
                    level: building.level,
                }
            };
            info!(building = %building.id, level = building.level, "construction complete");
            self.events.push(now, kind);
        }
        completed
    }

    /// Take the pending change notifications
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}
