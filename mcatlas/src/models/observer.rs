use std::sync::atomic::{AtomicUsize, Ordering};

/// Instrumentation hook a host may attach to a pricing run.
///
/// Callbacks arrive from worker threads, in no particular order, after each
/// batch of trials. They must not influence the simulation.
pub trait SimulationObserver: Sync {
    fn on_batch_complete(&self, completed_paths: usize, total_paths: usize);
}

/// Observer that only counts finished paths.
#[derive(Debug, Default)]
pub struct PathCounter {
    completed: AtomicUsize,
    batches: AtomicUsize,
}

impl PathCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }
}

impl SimulationObserver for PathCounter {
    fn on_batch_complete(&self, completed_paths: usize, _total_paths: usize) {
        self.completed.fetch_max(completed_paths, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
    }
}
