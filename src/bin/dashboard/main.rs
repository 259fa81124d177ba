mod api_util;
mod pages;
mod sampler;
mod state_actor;

use anyhow::Context;
use api_util::ApiError;
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{Local, Utc};
use clap::Parser;
use serde::Serialize;
use state_actor::StateActorHandle;
use statusdeck::aggregate::{self, check_all, sort_issues_first, DEFAULT_CONCURRENCY};
use statusdeck::daily_log::DailyLog;
use statusdeck::fetch::{Fetch, HttpFetcher};
use statusdeck::history::HistoryStats;
use statusdeck::schedule::INTERVAL_MINUTES;
use statusdeck::{export, mock, Provider, Sample, Snapshot};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const UPTIME_DAYS: u32 = 90;

#[derive(Clone)]
struct AppState {
    state: StateActorHandle,
    fetcher: Arc<dyn Fetch>,
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let fetcher: Arc<dyn Fetch> = Arc::new(
        HttpFetcher::new(Duration::from_secs(cli.timeout_secs))
            .context("Couldn't build HTTP client")?,
    );
    let app_state = AppState {
        state: StateActorHandle::new(DailyLog::default(), 32),
        fetcher: Arc::clone(&fetcher),
        concurrency: cli.concurrency,
    };

    if cli.no_sampler {
        warn!("Background sampler disabled, daily report will stay empty");
    } else {
        tokio::spawn(sampler::run(
            app_state.state.clone(),
            fetcher,
            cli.interval_minutes,
        ));
    }

    info!("Binding to {}", cli.address);
    let listener = tokio::net::TcpListener::bind(&cli.address)
        .await
        .with_context(|| format!("Couldn't bind to {}", cli.address))?;
    info!("Starting dashboard");
    axum::serve(listener, app(app_state))
        .await
        .context("Dashboard server failed")?;
    Ok(())
}

fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/monitoring", get(monitoring))
        .route("/service/:name", get(service_detail))
        .route("/dashboard", get(dashboard))
        .route("/download_report", get(download_report))
        .route("/download_daily_report", get(download_daily_report))
        .route("/get_report_text", get(report_text))
        .route("/api/history/:name", get(history))
        .route("/api/daily", get(daily))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

/// Runs a full check cycle and feeds the results into history.
async fn check_and_record(app_state: &AppState) -> Result<Vec<Sample>, ApiError> {
    let samples = check_all(
        &Provider::ALL,
        Arc::clone(&app_state.fetcher),
        app_state.concurrency,
    )
    .await;
    app_state.state.record_samples(samples.clone()).await?;
    Ok(samples)
}

async fn index(State(app_state): State<AppState>) -> Result<Html<String>, ApiError> {
    let samples = check_and_record(&app_state).await?;
    Ok(Html(pages::overview("Service status", &samples)))
}

async fn monitoring(State(app_state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut samples = check_and_record(&app_state).await?;
    sort_issues_first(&mut samples);
    Ok(Html(pages::overview("Monitoring", &samples)))
}

async fn service_detail(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let provider = Provider::find(&name).ok_or(ApiError::ProviderNotFound(name))?;
    let current = aggregate::sample(provider, app_state.fetcher.as_ref()).await;
    app_state.state.record_samples(vec![current.clone()]).await?;
    let (history, stats) = app_state.state.get_history(provider.name()).await?;

    let (components, uptime) = {
        let mut rng = rand::thread_rng();
        (
            mock::components(provider, &mut rng),
            mock::uptime_series(UPTIME_DAYS, &mut rng),
        )
    };

    Ok(Html(pages::detail(&pages::Detail {
        provider,
        current: &current,
        history: &history,
        stats: stats.as_ref(),
        components: &components,
        uptime: &uptime,
    })))
}

#[derive(Serialize)]
struct DashboardSummary {
    checked_at: chrono::DateTime<Utc>,
    counts: BTreeMap<&'static str, usize>,
    services: Vec<Sample>,
}

async fn dashboard(State(app_state): State<AppState>) -> Result<Json<DashboardSummary>, ApiError> {
    let mut services = check_and_record(&app_state).await?;
    sort_issues_first(&mut services);
    let mut counts = BTreeMap::new();
    for sample in &services {
        *counts.entry(sample.severity.as_str()).or_insert(0) += 1;
    }
    Ok(Json(DashboardSummary {
        checked_at: Utc::now(),
        counts,
        services,
    }))
}

fn attachment(filename: String, mime: &'static str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
}

async fn download_report(State(app_state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let samples = check_and_record(&app_state).await?;
    let bytes = export::to_xlsx(&samples)?;
    let filename = format!("status_report_{}.xlsx", Local::now().format("%Y%m%d_%H%M"));
    Ok(attachment(filename, XLSX_MIME, bytes))
}

async fn download_daily_report(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let log = app_state.state.get_daily_log().await?;
    let bytes = export::daily_log_to_xlsx(&log, &Provider::ALL)?;
    let filename = format!("daily_report_{}.xlsx", Local::now().format("%Y%m%d"));
    Ok(attachment(filename, XLSX_MIME, bytes))
}

async fn report_text(State(app_state): State<AppState>) -> Result<String, ApiError> {
    let samples = check_and_record(&app_state).await?;
    Ok(export::to_text_table(&samples))
}

#[derive(Serialize)]
struct HistoryResponse {
    provider: &'static str,
    stats: Option<HistoryStats>,
    samples: Vec<Sample>,
}

async fn history(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let provider = Provider::find(&name).ok_or(ApiError::ProviderNotFound(name))?;
    let (samples, stats) = app_state.state.get_history(provider.name()).await?;
    Ok(Json(HistoryResponse {
        provider: provider.name(),
        stats,
        samples,
    }))
}

async fn daily(State(app_state): State<AppState>) -> Result<Json<Vec<Snapshot>>, ApiError> {
    Ok(Json(app_state.state.get_daily_log().await?))
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Listening address for the dashboard
    #[arg(short, long, env = "STATUSDECK_ADDRESS", default_value = "0.0.0.0:5000")]
    address: String,

    /// Status checks allowed to run at once per request
    #[arg(short, long, env = "STATUSDECK_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, env = "STATUSDECK_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    /// Minutes between background snapshots
    #[arg(long, env = "STATUSDECK_INTERVAL_MINUTES", default_value_t = INTERVAL_MINUTES)]
    interval_minutes: u32,

    /// Don't run the background sampler
    #[arg(long, env = "STATUSDECK_NO_SAMPLER")]
    no_sampler: bool,
}
