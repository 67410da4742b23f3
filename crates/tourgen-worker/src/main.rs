//! Property tour worker binary.
//!
//! Usage: `tourgen-worker <request.json>` where the file holds a `TourRequest`.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tourgen_models::TourRequest;
use tourgen_synth::{SynthesisService, VeoClient};
use tourgen_worker::{InMemoryJobStatusStore, TourGenerator, WorkerConfig};

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("tourgen=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        bail!("failed to install rustls crypto provider");
    }

    dotenvy::dotenv().ok();
    init_tracing()?;

    let request_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: tourgen-worker <request.json>"),
    };
    let raw = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("reading {}", request_path))?;
    let request: TourRequest =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", request_path))?;

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let synthesis = if std::env::var("GCP_PROJECT_ID").is_ok() {
        let client = VeoClient::from_env().await.context("configuring Vertex AI client")?;
        let synth_config = client.config().clone();
        let service: Arc<dyn SynthesisService> = Arc::new(client);
        Some((service, synth_config))
    } else {
        warn!("GCP_PROJECT_ID not set, AI scenes will be rendered with pan-zoom");
        None
    };

    let store = Arc::new(InMemoryJobStatusStore::new());
    let generator = TourGenerator::new(config, synthesis, store);

    let outcome = generator
        .generate(&request)
        .await
        .with_context(|| format!("generating tour {}", request.id))?;

    info!(
        job_id = %outcome.job_id,
        output = %outcome.output.display(),
        scenes = outcome.plan.len(),
        duration = outcome.report.duration,
        warnings = outcome.warnings.len(),
        "Tour ready"
    );
    println!("{}", serde_json::to_string_pretty(&outcome.plan)?);
    Ok(())
}
