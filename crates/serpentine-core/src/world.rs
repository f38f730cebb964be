//! Bounded grid world holding a single resource
//!
//! The world is authoritative for bounds checks and resource placement.
//! Coordinates grow right (x) and down (y), matching screen space.

use ahash::AHashSet;
use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::rng_trait::GridRng;

/// A grid coordinate
pub type Cell = IVec2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    width: i32,
    height: i32,
    resource: Cell,
}

impl World {
    /// Create a world with the resource at a known cell
    pub fn with_resource(width: i32, height: i32, resource: Cell) -> SimResult<Self> {
        validate_grid(width, height)?;
        let world = Self {
            width,
            height,
            resource,
        };
        if world.is_out_of_bounds(resource) {
            return Err(SimError::ResourceOutOfBounds { cell: resource });
        }
        Ok(world)
    }

    /// Create a world and place its resource uniformly on a cell not in `occupied`
    pub fn spawn(
        width: i32,
        height: i32,
        occupied: &AHashSet<Cell>,
        rng: &mut impl GridRng,
    ) -> SimResult<Self> {
        validate_grid(width, height)?;
        let mut world = Self {
            width,
            height,
            resource: Cell::ZERO,
        };
        world.resource = world.reset_resource(occupied, rng)?;
        Ok(world)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Current resource location
    pub fn resource(&self) -> Cell {
        self.resource
    }

    /// True iff x is outside [0, width) or y is outside [0, height)
    pub fn is_out_of_bounds(&self, cell: Cell) -> bool {
        cell.x < 0 || cell.x >= self.width || cell.y < 0 || cell.y >= self.height
    }

    /// Sample a resource cell uniformly from the complement of `occupied`.
    ///
    /// Pure with respect to the world: the caller decides whether to install
    /// the returned cell.
    pub fn reset_resource(
        &self,
        occupied: &AHashSet<Cell>,
        rng: &mut impl GridRng,
    ) -> SimResult<Cell> {
        let free: Vec<Cell> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Cell::new(x, y)))
            .filter(|cell| !occupied.contains(cell))
            .collect();

        if free.is_empty() {
            return Err(SimError::GridFull {
                width: self.width,
                height: self.height,
            });
        }

        Ok(free[rng.pick_index(free.len())])
    }

    /// Replace the resource with a fresh one that avoids every cell in `body`.
    ///
    /// `slot` is only used to label an invariant violation.
    pub fn relocate_resource<'a>(
        &mut self,
        body: impl IntoIterator<Item = &'a Cell>,
        rng: &mut impl GridRng,
        slot: usize,
    ) -> SimResult<Cell> {
        let occupied: AHashSet<Cell> = body.into_iter().copied().collect();
        let next = self.reset_resource(&occupied, rng)?;

        if occupied.contains(&next) || self.is_out_of_bounds(next) {
            return Err(SimError::invariant(
                "resource-off-body",
                slot,
                format!("resource sampled onto occupied cell {}", next),
            ));
        }

        self.resource = next;
        Ok(next)
    }

    /// Move the resource to a specific in-bounds cell
    pub fn set_resource(&mut self, cell: Cell) -> SimResult<()> {
        if self.is_out_of_bounds(cell) {
            return Err(SimError::ResourceOutOfBounds { cell });
        }
        self.resource = cell;
        Ok(())
    }
}

pub(crate) fn validate_grid(width: i32, height: i32) -> SimResult<()> {
    if width <= 0 || height <= 0 {
        return Err(SimError::InvalidGrid { width, height });
    }
    Ok(())
}
