//! Synthesized figures for the service detail page. Status pages do not
//! expose per-component history in a form worth scraping, so these are
//! generated.

use crate::{Provider, Severity};
use rand::Rng;
use serde::Serialize;

const COMPONENT_NAMES: [&str; 8] = [
    "API",
    "Web console",
    "Authentication",
    "Storage",
    "Networking",
    "Notifications",
    "Webhooks",
    "Billing",
];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub severity: Severity,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DayUptime {
    /// Days before today; 0 is today.
    pub days_ago: u32,
    pub percent: f64,
}

/// Three to six components, mostly healthy.
pub fn components<R: Rng>(provider: Provider, rng: &mut R) -> Vec<Component> {
    let count = rng.gen_range(3..=6);
    let offset = provider as usize;
    (0..count)
        .map(|i| {
            let roll: u8 = rng.gen_range(0..100);
            let severity = match roll {
                0..=84 => Severity::Ok,
                85..=91 => Severity::Maintenance,
                92..=96 => Severity::Minor,
                _ => Severity::Major,
            };
            Component {
                name: COMPONENT_NAMES[(offset + i) % COMPONENT_NAMES.len()].to_string(),
                severity,
            }
        })
        .collect()
}

/// Daily availability for the last `days` days, newest first.
pub fn uptime_series<R: Rng>(days: u32, rng: &mut R) -> Vec<DayUptime> {
    (0..days)
        .map(|days_ago| {
            let percent = if rng.gen_bool(0.8) {
                100.0
            } else {
                rng.gen_range(95.0..100.0)
            };
            DayUptime { days_ago, percent }
        })
        .collect()
}

/// Mean of a series, or 100 for an empty one.
pub fn overall_uptime(series: &[DayUptime]) -> f64 {
    if series.is_empty() {
        return 100.0;
    }
    series.iter().map(|d| d.percent).sum::<f64>() / series.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn components_are_bounded_and_named() {
        let mut rng = StdRng::seed_from_u64(7);
        for provider in Provider::ALL {
            let comps = components(provider, &mut rng);
            assert!((3..=6).contains(&comps.len()));
            assert!(comps.iter().all(|c| !c.name.is_empty()));
            assert!(comps.iter().all(|c| c.severity != Severity::Unavailable));
        }
    }

    #[test]
    fn uptime_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let series = uptime_series(90, &mut rng);
        assert_eq!(series.len(), 90);
        assert_eq!(series[0].days_ago, 0);
        assert!(series.iter().all(|d| (95.0..=100.0).contains(&d.percent)));
        let overall = overall_uptime(&series);
        assert!((95.0..=100.0).contains(&overall));
    }

    #[test]
    fn empty_series_is_fully_up() {
        assert_eq!(overall_uptime(&[]), 100.0);
    }
}
