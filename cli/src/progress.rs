//! Progress reporting for paginated and bucketed runs
//!
//! A thin wrapper over indicatif that honors the `--no-progress-bar`
//! toggle. Progress is a side channel only: queries behave identically
//! with it disabled.

use indicatif::ProgressBar;

pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// A bar sized to `len` steps, or a no-op when disabled.
    pub fn new(enabled: bool, len: u64) -> Self {
        Self {
            bar: enabled.then(|| ProgressBar::new(len)),
        }
    }

    /// Re-size once the first response reveals the real total.
    pub fn set_total(&self, total: u64) {
        if let Some(bar) = &self.bar {
            bar.set_length(total);
        }
    }

    pub fn advance(&self, steps: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(steps);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }
}
