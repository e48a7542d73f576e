use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use mcatlas::models::observer::SimulationObserver;

/// Terminal progress bar fed by the pricer's batch callbacks.
pub struct ProgressObserver {
    bar: ProgressBar,
    high_water: AtomicU64,
}

impl ProgressObserver {
    pub fn new(total_paths: usize) -> Self {
        let bar = ProgressBar::new(total_paths as u64);
        let style = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} paths ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self {
            bar,
            high_water: AtomicU64::new(0),
        }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            high_water: AtomicU64::new(0),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SimulationObserver for ProgressObserver {
    fn on_batch_complete(&self, completed_paths: usize, _total_paths: usize) {
        // batches finish out of order, keep the bar monotone
        let completed = completed_paths as u64;
        let previous = self.high_water.fetch_max(completed, Ordering::Relaxed);
        if completed > previous {
            self.bar.set_position(completed);
        }
    }
}
