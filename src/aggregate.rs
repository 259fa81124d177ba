use crate::fetch::Fetch;
use crate::{Provider, Sample, Severity};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Checks `provider` and times it.
pub async fn sample(provider: Provider, fetcher: &dyn Fetch) -> Sample {
    let started = Instant::now();
    let severity = provider.check(fetcher).await;
    Sample {
        provider: provider.name().to_string(),
        severity,
        latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        time: Utc::now(),
    }
}

/// Checks every provider in parallel, at most `concurrency` at a time.
/// Returns exactly one sample per provider, sorted by name.
pub async fn check_all(
    providers: &[Provider],
    fetcher: Arc<dyn Fetch>,
    concurrency: usize,
) -> Vec<Sample> {
    let started = Instant::now();
    let limiter = Arc::new(Semaphore::new(concurrency.max(1)));

    let tasks = providers.iter().map(|&provider| {
        let fetcher = Arc::clone(&fetcher);
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await.ok();
            sample(provider, fetcher.as_ref()).await
        })
    });
    let joined = join_all(tasks).await;

    let mut results: Vec<Sample> = providers
        .iter()
        .zip(joined)
        .map(|(provider, joined)| {
            joined.unwrap_or_else(|e| {
                error!(provider = provider.name(), error = %e, "check task died");
                Sample {
                    provider: provider.name().to_string(),
                    severity: Severity::Unavailable,
                    latency_ms: 0,
                    time: Utc::now(),
                }
            })
        })
        .collect();
    sort_by_name(&mut results);

    info!(
        checks = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "check cycle completed"
    );
    results
}

/// Checks every provider one after the other.
pub async fn check_sequential(providers: &[Provider], fetcher: &dyn Fetch) -> Vec<Sample> {
    let mut results = Vec::with_capacity(providers.len());
    for &provider in providers {
        results.push(sample(provider, fetcher).await);
    }
    sort_by_name(&mut results);
    results
}

pub fn sort_by_name(samples: &mut [Sample]) {
    samples.sort_by(|a, b| a.provider.cmp(&b.provider));
}

/// Worst severity first, then by name.
pub fn sort_issues_first(samples: &mut [Sample]) {
    samples.sort_by(|a, b| {
        b.severity
            .priority()
            .cmp(&a.severity.priority())
            .then_with(|| a.provider.cmp(&b.provider))
    });
}
