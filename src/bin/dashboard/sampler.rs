use crate::state_actor::{StateActorError, StateActorHandle};
use chrono::{DateTime, Local};
use statusdeck::aggregate::check_sequential;
use statusdeck::fetch::Fetch;
use statusdeck::schedule::{bucket_label, next_boundary, until_next_boundary};
use statusdeck::{Provider, Snapshot};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Wakes on every `interval_minutes` boundary and records one snapshot.
/// Checks run one at a time so they stay out of the way of the request
/// handlers' pool.
pub async fn run(state: StateActorHandle, fetcher: Arc<dyn Fetch>, interval_minutes: u32) {
    info!(interval_minutes, "Starting background sampler");
    loop {
        let now = Local::now();
        let wait = until_next_boundary(&now, interval_minutes);
        let target = next_boundary(&now, interval_minutes);
        debug!(seconds = wait.as_secs(), %target, "Sampler sleeping");
        tokio::time::sleep(wait).await;

        if let Err(e) = sample_once(&state, fetcher.as_ref(), target, interval_minutes).await {
            error!("Sampler stopping: {e}");
            return;
        }
    }
}

/// Runs one pass for the grid point `boundary`, which labels the snapshot
/// and drives the midnight reset.
pub async fn sample_once(
    state: &StateActorHandle,
    fetcher: &dyn Fetch,
    boundary: DateTime<Local>,
    interval_minutes: u32,
) -> Result<usize, StateActorError> {
    let samples = check_sequential(&Provider::ALL, fetcher).await;
    let bucket = bucket_label(&boundary, interval_minutes);
    let snapshot = Snapshot::from_samples(bucket.clone(), &samples);

    state.record_samples(samples).await?;
    let entries = state.record_snapshot(snapshot, boundary.time()).await?;
    info!(%bucket, entries, "Snapshot recorded");
    Ok(entries)
}
