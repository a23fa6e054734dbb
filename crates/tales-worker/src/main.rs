//! Vendor job poller binary.
//!
//! Usage: `tales-worker <vendor> <job-id>...`
//!
//! Polls already-submitted vendor jobs until each finishes, printing one
//! JSON line per job followed by a summary line.

use std::net::SocketAddr;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tales_models::{JobId, Outcome, Vendor};
use tales_poller::{JobLimiter, JobPoller, JobStore};
use tales_vendors::VendorClient;
use tales_worker::{BatchItem, BatchReport, WorkerConfig, WorkerError};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    if let Err(e) = run().await {
        error!("tales-worker failed: {:#}", e);
        std::process::exit(1);
    }
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tales=info,warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

fn init_metrics() -> anyhow::Result<()> {
    let enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true);
    if !enabled {
        return Ok(());
    }

    let addr: SocketAddr = std::env::var("METRICS_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:9100".to_string())
        .parse()
        .context("METRICS_ADDR must be a socket address")?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics enabled at http://{}/metrics", addr);
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let vendor: Vendor = args
        .next()
        .context("usage: tales-worker <vendor> <job-id>...")?
        .parse()?;
    let job_ids: Vec<JobId> = args.map(JobId::from).collect();
    if job_ids.is_empty() {
        anyhow::bail!("usage: tales-worker <vendor> <job-id>...");
    }

    init_metrics()?;

    let config = WorkerConfig::from_env()?;
    info!("Worker config: {:?}", config);

    let client = VendorClient::from_env(vendor)?;
    let store = JobStore::new();
    let poller = JobPoller::new(config.poll_config()?)
        .with_store(store.clone())
        .with_label(vendor.as_str());
    let limiter = JobLimiter::new(config.max_in_flight_for(vendor)).with_label(vendor.as_str());

    info!(
        vendor = %vendor,
        jobs = job_ids.len(),
        max_in_flight = limiter.capacity(),
        "Polling jobs"
    );

    let runner = tales_worker::BatchRunner::new(vendor, limiter, poller);
    let report = runner.await_all(&job_ids, &client).await;

    for item in report.items() {
        println!("{}", item_line(item));
    }
    println!("{}", summary_line(vendor, &report, config.success_threshold));

    let counts = store.counts().await;
    info!("Final job states: {:?}", counts);

    if !report.meets_threshold(config.success_threshold) {
        warn!(
            ratio = report.success_ratio(),
            threshold = config.success_threshold,
            "Batch below success threshold"
        );
        return Err(WorkerError::below_threshold(format!(
            "{:.0}% of {} jobs succeeded, need {:.0}%",
            report.success_ratio() * 100.0,
            report.len(),
            config.success_threshold * 100.0
        ))
        .into());
    }

    Ok(())
}

fn item_line(item: &BatchItem<Value, String>) -> Value {
    match item {
        BatchItem::Finished { job_id, outcome, .. } => match outcome {
            Outcome::Success(result) => {
                json!({"job_id": job_id, "outcome": outcome.as_str(), "result": result})
            }
            Outcome::Failure(reason) => {
                json!({"job_id": job_id, "outcome": outcome.as_str(), "error": reason})
            }
            Outcome::TimedOut => json!({"job_id": job_id, "outcome": outcome.as_str()}),
        },
        BatchItem::SubmitFailed { error, .. } => {
            json!({"job_id": Value::Null, "outcome": "rejected", "error": error})
        }
    }
}

fn summary_line(vendor: Vendor, report: &BatchReport<Value, String>, threshold: f64) -> Value {
    json!({
        "vendor": vendor,
        "total": report.len(),
        "succeeded": report.successes().len(),
        "failed": report.failures().len(),
        "timed_out": report.timed_out(),
        "rejected": report.submit_failures(),
        "success_ratio": report.success_ratio(),
        "meets_threshold": report.meets_threshold(threshold),
    })
}
