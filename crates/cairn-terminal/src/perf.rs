use std::time::{Duration, Instant};

/// Logs the elapsed time of a region at debug level when dropped.
#[derive(Debug)]
pub struct PerfMonitor {
    label: String,
    start: Instant,
}

impl PerfMonitor {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfMonitor {
    fn drop(&mut self) {
        log::debug!("{}: {:.3?}", self.label, self.start.elapsed());
    }
}
