//! Transporter: a vehicle carrying a grid of container stacks.
//!
//! A transporter owns a `limit_x * limit_y` grid. Every cell holds a stack
//! of containers (last in, first out), and the total number of containers
//! across all cells is capped by the transporter's capacity.
//!
//! Only occupied cells are stored, keyed by [`GridPoint`], so iteration over
//! [`Transporter::containers`] visits x ascending, then y ascending, then
//! each stack from bottom to top. The grid bounds are `u64` so every `u32`
//! coordinate has a cell.

use std::collections::BTreeMap;

use harbour_types::{Container, GridPoint, TransportCategory, TransporterId};

/// Errors raised by grid operations.
#[derive(Debug, thiserror::Error)]
pub enum TransporterError {
    /// The transporter already holds its maximum number of containers.
    ///
    /// The rejected container is handed back so it is not lost.
    #[error("transporter {transporter_id} is full ({capacity} containers)")]
    CapacityExceeded {
        /// The transporter that rejected the container.
        transporter_id: TransporterId,
        /// The configured capacity.
        capacity: usize,
        /// The container that could not be placed.
        container: Box<Container>,
    },

    /// The addressed cell has no containers.
    #[error("no container at {point} on transporter {transporter_id}")]
    EmptyStack {
        /// The transporter that was addressed.
        transporter_id: TransporterId,
        /// The empty cell.
        point: GridPoint,
    },

    /// The addressed cell lies outside the grid.
    #[error("cell {point} outside {limit_x}x{limit_y} grid of transporter {transporter_id}")]
    OutOfBounds {
        /// The transporter that was addressed.
        transporter_id: TransporterId,
        /// The requested cell.
        point: GridPoint,
        /// Number of rows.
        limit_x: u64,
        /// Number of columns.
        limit_y: u64,
        /// The container a failed put was carrying, handed back.
        container: Option<Box<Container>>,
    },
}

impl TransporterError {
    /// Recover the container a failed [`Transporter::put_container`] was
    /// given.
    pub fn into_container(self) -> Option<Container> {
        match self {
            Self::CapacityExceeded { container, .. } => Some(*container),
            Self::OutOfBounds { container, .. } => container.map(|c| *c),
            Self::EmptyStack { .. } => None,
        }
    }
}

/// A single-use vehicle loaded by the distribution engine.
#[derive(Debug, Clone)]
pub struct Transporter {
    id: TransporterId,
    category: TransportCategory,
    limit_x: u64,
    limit_y: u64,
    capacity: usize,
    len: usize,
    cells: BTreeMap<GridPoint, Vec<Container>>,
}

impl Transporter {
    /// Create an empty transporter with a fresh id.
    ///
    /// Grid dimensions of zero are raised to one so every transporter has
    /// at least one cell.
    pub fn new(category: TransportCategory, limit_x: u64, limit_y: u64, capacity: usize) -> Self {
        Self {
            id: TransporterId::new(),
            category,
            limit_x: limit_x.max(1),
            limit_y: limit_y.max(1),
            capacity,
            len: 0,
            cells: BTreeMap::new(),
        }
    }

    /// Push a container onto the stack at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`TransporterError::OutOfBounds`] if `point` is outside the
    /// grid, or [`TransporterError::CapacityExceeded`] if the transporter is
    /// full. In both cases the transporter is left unchanged and the error
    /// carries the container.
    pub fn put_container(
        &mut self,
        point: GridPoint,
        container: Container,
    ) -> Result<(), TransporterError> {
        if !self.contains(point) {
            return Err(TransporterError::OutOfBounds {
                transporter_id: self.id,
                point,
                limit_x: self.limit_x,
                limit_y: self.limit_y,
                container: Some(Box::new(container)),
            });
        }
        if self.len >= self.capacity {
            return Err(TransporterError::CapacityExceeded {
                transporter_id: self.id,
                capacity: self.capacity,
                container: Box::new(container),
            });
        }
        self.cells.entry(point).or_default().push(container);
        self.len = self.len.saturating_add(1);
        Ok(())
    }

    /// Pop the top container from the stack at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`TransporterError::OutOfBounds`] if `point` is outside the
    /// grid, or [`TransporterError::EmptyStack`] if the cell is empty.
    pub fn take_container(&mut self, point: GridPoint) -> Result<Container, TransporterError> {
        if !self.contains(point) {
            return Err(self.out_of_bounds(point));
        }
        let container = self
            .cells
            .get_mut(&point)
            .and_then(Vec::pop)
            .ok_or(TransporterError::EmptyStack {
                transporter_id: self.id,
                point,
            })?;
        if self.cells.get(&point).is_some_and(Vec::is_empty) {
            self.cells.remove(&point);
        }
        self.len = self.len.saturating_sub(1);
        Ok(container)
    }

    /// Stack depth at `point`; 0 for an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`TransporterError::OutOfBounds`] if `point` is outside the grid.
    pub fn height_at(&self, point: GridPoint) -> Result<usize, TransporterError> {
        if !self.contains(point) {
            return Err(self.out_of_bounds(point));
        }
        Ok(self.cells.get(&point).map_or(0, Vec::len))
    }

    /// Iterate over every carried container in grid order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.cells.values().flatten()
    }

    /// Transporter id.
    pub const fn id(&self) -> TransporterId {
        self.id
    }

    /// Vehicle category.
    pub const fn category(&self) -> TransportCategory {
        self.category
    }

    /// Number of grid rows.
    pub const fn limit_x(&self) -> u64 {
        self.limit_x
    }

    /// Number of grid columns.
    pub const fn limit_y(&self) -> u64 {
        self.limit_y
    }

    /// Maximum number of containers.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of carried containers.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the transporter carries nothing.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, point: GridPoint) -> bool {
        u64::from(point.x) < self.limit_x && u64::from(point.y) < self.limit_y
    }

    const fn out_of_bounds(&self, point: GridPoint) -> TransporterError {
        TransporterError::OutOfBounds {
            transporter_id: self.id,
            point,
            limit_x: self.limit_x,
            limit_y: self.limit_y,
            container: None,
        }
    }
}
