//! Outstanding-load counter that gates interactive mode.

use serde::{Deserialize, Serialize};

/// Kinds of asynchronous loads the scene waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadTask {
    /// The background image.
    Background,
    /// Intrinsic size probe of an SVG background.
    SvgProbe,
    /// The scene document from the load channel.
    Document,
}

/// Counts loads in flight. The scene is ready once every load that was
/// started has completed successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadTracker {
    outstanding: usize,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, task: LoadTask) {
        self.outstanding += 1;
        log::debug!("Load started: {:?} ({} outstanding)", task, self.outstanding);
    }

    /// Mark one load complete. Returns true when this completion made the
    /// scene ready.
    pub fn finish(&mut self, task: LoadTask) -> bool {
        if self.outstanding == 0 {
            log::warn!("Load {:?} finished without a matching start", task);
            return false;
        }
        self.outstanding -= 1;
        log::debug!("Load finished: {:?} ({} outstanding)", task, self.outstanding);
        self.outstanding == 0
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_ready(&self) -> bool {
        self.outstanding == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_after_all_loads() {
        let mut tracker = LoadTracker::new();
        tracker.begin(LoadTask::Background);
        tracker.begin(LoadTask::SvgProbe);
        tracker.begin(LoadTask::Document);
        assert!(!tracker.is_ready());

        assert!(!tracker.finish(LoadTask::Document));
        assert!(!tracker.finish(LoadTask::Background));
        assert!(tracker.finish(LoadTask::SvgProbe));
        assert!(tracker.is_ready());
    }

    #[test]
    fn test_unmatched_finish_is_ignored() {
        let mut tracker = LoadTracker::new();
        assert!(!tracker.finish(LoadTask::Document));
        assert_eq!(tracker.outstanding(), 0);
    }
}
