use crate::schedule::{in_midnight_window, INTERVAL_MINUTES};
use crate::Snapshot;
use chrono::Timelike;
use std::collections::VecDeque;

/// Entry count past which the midnight reset clears the log.
pub const RESET_THRESHOLD: usize = 90;

/// Hard bound on the log: one week of 15-minute snapshots.
pub const DEFAULT_CAPACITY: usize = 7 * 24 * 4;

/// Snapshots taken by the sampler since the last reset, oldest first.
#[derive(Debug, Clone)]
pub struct DailyLog {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for DailyLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DailyLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Applies the midnight reset, then appends `snapshot`, so the first
    /// snapshot of a new day survives the reset it triggers.
    pub fn record<T: Timelike>(&mut self, snapshot: Snapshot, now: &T) {
        self.reset_if_due(now);
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Clears the log if `now` is in the midnight window and the log has
    /// grown past `RESET_THRESHOLD`. Returns whether it did.
    pub fn reset_if_due<T: Timelike>(&mut self, now: &T) -> bool {
        if in_midnight_window(now, INTERVAL_MINUTES) && self.entries.len() > RESET_THRESHOLD {
            tracing::info!(entries = self.entries.len(), "resetting daily log");
            self.entries.clear();
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.entries.iter().cloned().collect()
    }
}
