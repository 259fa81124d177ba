use crate::{Sample, Severity};
use serde::Serialize;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 30;

/// The most recent samples of one provider, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: Sample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    #[must_use]
    pub fn stats(&self) -> Option<HistoryStats> {
        let last = self.latest()?;
        let latencies = self.samples.iter().map(|s| s.latency_ms);
        let total: u64 = latencies.clone().sum();
        let reachable = self
            .samples
            .iter()
            .filter(|s| s.severity != Severity::Unavailable)
            .count();
        let len = self.samples.len();

        Some(HistoryStats {
            samples: len,
            last_ms: last.latency_ms,
            min_ms: latencies.clone().min().unwrap_or_default(),
            max_ms: latencies.max().unwrap_or_default(),
            avg_ms: total as f64 / len as f64,
            availability: reachable as f64 * 100.0 / len as f64,
        })
    }
}

/// Latency summary over a `History`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub samples: usize,
    pub last_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    /// Percentage of samples whose page could be read at all.
    pub availability: f64,
}
