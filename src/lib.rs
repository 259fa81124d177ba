pub mod aggregate;
pub mod daily_log;
pub mod export;
pub mod fetch;
pub mod history;
pub mod mock;
pub mod providers;
pub mod schedule;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

pub use providers::Provider;

/// The normalized health of a provider, as read from its status page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Maintenance,
    Minor,
    Major,
    Critical,
    Unavailable,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Self::Ok,
        Self::Maintenance,
        Self::Minor,
        Self::Major,
        Self::Critical,
        Self::Unavailable,
    ];

    /// Rank used by the issues-first ordering. Higher sorts first.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Critical => 5,
            Self::Major => 4,
            Self::Minor => 3,
            Self::Unavailable => 2,
            Self::Maintenance => 1,
            Self::Ok => 0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Maintenance => "maintenance",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
            Self::Unavailable => "unavailable",
        }
    }

    /// Human-readable label shown on the dashboard.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "Operational",
            Self::Maintenance => "Maintenance",
            Self::Minor => "Minor issues",
            Self::Major => "Major outage",
            Self::Critical => "Critical outage",
            Self::Unavailable => "Unavailable",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Ok => "green",
            Self::Maintenance => "blue",
            Self::Minor => "yellow",
            Self::Major => "orange",
            Self::Critical => "red",
            Self::Unavailable => "gray",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a provider: what it reported and how long it took.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub provider: String,
    pub severity: Severity,
    pub latency_ms: u64,
    pub time: DateTime<Utc>,
}

/// Severities of every provider at one point of the 15-minute grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// `HH:MM`, local time.
    pub bucket: String,
    pub statuses: BTreeMap<String, Severity>,
}

impl Snapshot {
    pub fn from_samples(bucket: String, samples: &[Sample]) -> Self {
        Self {
            bucket,
            statuses: samples
                .iter()
                .map(|s| (s.provider.clone(), s.severity))
                .collect(),
        }
    }
}
