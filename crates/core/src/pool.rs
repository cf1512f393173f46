//! Recycling of scratch grids
//!
//! Every filter stage needs a handful of temporary grids with the shape of
//! the input. Allocating and zeroing them on each run dominates small
//! filters, so they are kept in a pool that is tied to one [`GridShape`].

use crate::raster::{Grid, GridShape};
use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

/// A pool of same-shaped grids.
///
/// The pool is driven from a single controlling thread; workers only ever
/// see the grids handed out by it, never the pool itself.
#[derive(Debug, Default)]
pub struct GridPool {
    shape: Option<GridShape>,
    free: RefCell<Vec<Grid>>,
    allocated: Cell<usize>,
}

impl GridPool {
    /// Create an empty pool without a shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool for grids of `shape`
    pub fn with_shape(shape: GridShape) -> Self {
        let mut pool = Self::new();
        pool.reset(shape);
        pool
    }

    /// Set the shape of pooled grids, discarding all buffers if it changed
    pub fn reset(&mut self, shape: GridShape) {
        if self.shape != Some(shape) {
            self.free.get_mut().clear();
            self.shape = Some(shape);
        }
    }

    /// Discard all buffers and forget the shape
    pub fn clear(&mut self) {
        self.free.get_mut().clear();
        self.shape = None;
    }

    /// The shape of pooled grids
    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    /// Number of grids waiting for reuse
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }

    /// Number of grids this pool has allocated since creation
    pub fn allocations(&self) -> usize {
        self.allocated.get()
    }

    /// Borrow a grid; its contents are undefined.
    ///
    /// The grid returns to the pool when the guard is dropped, including
    /// during unwinding.
    ///
    /// # Panics
    /// If the pool has no shape yet.
    #[track_caller]
    pub fn acquire(&self) -> PooledGrid<'_> {
        let recycled = self.free.borrow_mut().pop();
        let grid = match recycled {
            Some(grid) => grid,
            None => {
                let shape = match self.shape {
                    Some(shape) => shape,
                    None => panic!("GridPool::acquire called before GridPool::reset"),
                };
                self.allocated.set(self.allocated.get() + 1);
                trace!(rows = shape.rows, cols = shape.cols, "allocating pooled grid");
                Grid::from_shape(shape)
            }
        };
        PooledGrid {
            grid: Some(grid),
            pool: self,
        }
    }

    /// Hand a detached grid back. Grids of another shape are dropped.
    pub fn release(&self, mut grid: Grid) {
        if self.shape == Some(grid.grid_shape()) {
            grid.set_name(None);
            self.free.borrow_mut().push(grid);
        }
    }

    /// Recycle a shared grid if nobody else holds a reference to it
    pub fn release_shared(&self, grid: Arc<Grid>) {
        if let Ok(grid) = Arc::try_unwrap(grid) {
            self.release(grid);
        }
    }
}

/// Scoped loan of a pooled grid
#[derive(Debug)]
pub struct PooledGrid<'a> {
    grid: Option<Grid>,
    pool: &'a GridPool,
}

impl PooledGrid<'_> {
    /// Keep the grid instead of returning it to the pool
    pub fn into_inner(mut self) -> Grid {
        match self.grid.take() {
            Some(grid) => grid,
            None => unreachable!("pooled grid already detached"),
        }
    }
}

impl Deref for PooledGrid<'_> {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        match &self.grid {
            Some(grid) => grid,
            None => unreachable!("pooled grid already detached"),
        }
    }
}

impl DerefMut for PooledGrid<'_> {
    fn deref_mut(&mut self) -> &mut Grid {
        match &mut self.grid {
            Some(grid) => grid,
            None => unreachable!("pooled grid already detached"),
        }
    }
}

impl Drop for PooledGrid<'_> {
    fn drop(&mut self) {
        if let Some(grid) = self.grid.take() {
            self.pool.release(grid);
        }
    }
}
