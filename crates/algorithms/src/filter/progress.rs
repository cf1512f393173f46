//! Progress reporting and cancellation

use super::stage::Stage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives progress of a filter pass.
///
/// All methods default to doing nothing. Cancellation is checked between
/// stages, never inside one.
pub trait ProgressSink {
    /// A pass begins
    fn start(&mut self) {}

    /// Number of stages this pass will compute
    fn set_total_stage_count(&mut self, _count: usize) {}

    /// `stage` is about to run
    fn on_stage_begin(&mut self, _stage: Stage) {}

    /// Overall progress; returning `false` cancels the pass
    fn on_progress_percent(&mut self, _percent: u32) -> bool {
        true
    }

    /// Whether the pass should stop before the next stage
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Ignores all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// A cancellation flag that can be raised from any thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear the flag for the next pass
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

impl ProgressSink for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
