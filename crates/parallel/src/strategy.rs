//! Parallel processing strategies

use ndarray::ArrayViewMut2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use relief_core::RowBand;
use serde::{Deserialize, Serialize};
#[cfg(feature = "parallel")]
use std::collections::HashMap;
#[cfg(feature = "parallel")]
use std::sync::{Arc, Mutex, OnceLock};
#[cfg(feature = "parallel")]
use tracing::{debug, warn};

/// Bands cut per worker thread; more than one evens out uneven rows.
const BANDS_PER_THREAD: usize = 4;

/// Processing mode for grid operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for a thread count as given on a command line: 0 = all cores,
    /// 1 = sequential
    pub fn from_threads(threads: usize) -> Self {
        match threads {
            0 => ProcessingMode::Parallel,
            1 => ProcessingMode::Sequential,
            n => ProcessingMode::ParallelWith(n),
        }
    }

    /// Number of workers this mode runs bands on
    pub fn num_threads(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => num_cpus(),
            ProcessingMode::ParallelWith(threads) => (*threads).max(1),
        }
    }

    /// Rows per band for a grid of `rows` rows
    pub fn band_rows(&self, rows: usize) -> usize {
        match self {
            ProcessingMode::Sequential => rows.max(1),
            _ => rows
                .div_ceil(self.num_threads() * BANDS_PER_THREAD)
                .max(1),
        }
    }
}

/// Strategy for fork/join execution over row bands
pub trait ParallelStrategy {
    /// Split `view` (whose first row is grid row `first_row`) into disjoint
    /// bands and call `f` once per band. Returns after all bands are done.
    fn for_each_row_band<F>(&self, view: ArrayViewMut2<'_, f32>, first_row: usize, f: F)
    where
        F: Fn(RowBand<'_>) + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    fn for_each_row_band<F>(&self, view: ArrayViewMut2<'_, f32>, first_row: usize, f: F)
    where
        F: Fn(RowBand<'_>) + Sync + Send,
    {
        let band = RowBand::new(first_row, view);
        match self {
            ProcessingMode::Sequential => f(band),
            #[cfg(feature = "parallel")]
            ProcessingMode::Parallel => {
                let band_rows = self.band_rows(band.rows());
                let bands = band.split(band_rows);
                bands.into_par_iter().for_each(f);
            }
            #[cfg(feature = "parallel")]
            ProcessingMode::ParallelWith(threads) => {
                let band_rows = self.band_rows(band.rows());
                let bands = band.split(band_rows);
                match dedicated_pool(*threads) {
                    Ok(pool) => pool.install(|| bands.into_par_iter().for_each(f)),
                    Err(e) => {
                        warn!("cannot build a {threads}-thread pool ({e}), using the global pool");
                        bands.into_par_iter().for_each(f);
                    }
                }
            }
            #[cfg(not(feature = "parallel"))]
            _ => f(band),
        }
    }
}

/// Rayon pool with exactly `threads` workers, built on first use and shared
/// by every later call with the same count
#[cfg(feature = "parallel")]
pub fn dedicated_pool(threads: usize) -> Result<Arc<rayon::ThreadPool>, rayon::ThreadPoolBuildError> {
    static POOLS: OnceLock<Mutex<HashMap<usize, Arc<rayon::ThreadPool>>>> = OnceLock::new();

    let mut pools = POOLS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(pool) = pools.get(&threads) {
        return Ok(Arc::clone(pool));
    }
    let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(threads).build()?);
    debug!(threads, "built dedicated thread pool");
    pools.insert(threads, Arc::clone(&pool));
    Ok(pool)
}

/// Get the number of available CPU cores
#[cfg(feature = "parallel")]
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}

/// Get the number of available CPU cores
#[cfg(not(feature = "parallel"))]
pub fn num_cpus() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_core::Grid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fill_with_row_index(mode: ProcessingMode) -> Grid {
        let mut grid = Grid::new(37, 5);
        mode.for_each_row_band(grid.view_mut(), 0, |mut band| {
            band.for_each_cell_mut(|row, _, cell| *cell = row as f32);
        });
        grid
    }

    #[test]
    fn test_modes_write_identical_results() {
        let sequential = fill_with_row_index(ProcessingMode::Sequential);
        let parallel = fill_with_row_index(ProcessingMode::Parallel);
        let pooled = fill_with_row_index(ProcessingMode::ParallelWith(3));
        assert_eq!(sequential, parallel);
        assert_eq!(sequential, pooled);
        assert_eq!(sequential.get(36, 4).unwrap(), 36.0);
    }

    #[test]
    fn test_every_row_visited_once() {
        let mut grid = Grid::new(101, 3);
        let visited = AtomicUsize::new(0);
        ProcessingMode::ParallelWith(4).for_each_row_band(grid.view_mut(), 0, |band| {
            visited.fetch_add(band.rows(), Ordering::Relaxed);
        });
        assert_eq!(visited.load(Ordering::Relaxed), 101);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_dedicated_pool_is_reused() {
        let first = dedicated_pool(3).unwrap();
        let again = dedicated_pool(3).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.current_num_threads(), 3);
        assert!(!Arc::ptr_eq(&first, &dedicated_pool(2).unwrap()));

        // Repeated runs in one mode go through the same pool
        fill_with_row_index(ProcessingMode::ParallelWith(3));
        assert!(Arc::ptr_eq(&first, &dedicated_pool(3).unwrap()));
    }

    #[test]
    fn test_from_threads() {
        assert_eq!(ProcessingMode::from_threads(0), ProcessingMode::Parallel);
        assert_eq!(ProcessingMode::from_threads(1), ProcessingMode::Sequential);
        assert_eq!(ProcessingMode::from_threads(6), ProcessingMode::ParallelWith(6));
    }

    #[test]
    fn test_band_rows_never_zero() {
        assert_eq!(ProcessingMode::Sequential.band_rows(0), 1);
        assert!(ProcessingMode::ParallelWith(8).band_rows(3) >= 1);
    }
}
