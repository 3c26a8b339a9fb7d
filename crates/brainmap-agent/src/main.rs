//! Brainmap — Allen Brain Atlas gene expression fetcher.
//! Entry point: fetch → normalise → persist for each configured gene, then render figures.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use brainmap_ingestion::pipeline::{ExpressionPipeline, PipelineReport};
use brainmap_ingestion::repository::JsonFileStore;
use brainmap_ingestion::sources::{AllenClient, AtlasTransport, HttpTransport};
use brainmap_ranker::{ExpressionSummary, FigureRenderer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("brainmap=debug,info")),
        )
        .init();

    info!("Brainmap starting up, version {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load().context("Could not load brainmap.toml")?;
    info!(
        "Configuration loaded. Atlas: {}, genes: {}",
        config.atlas.base_url,
        config.pipeline.genes.join(", ")
    );

    let transport = HttpTransport::new(
        &config.atlas.base_url,
        Duration::from_secs(config.atlas.timeout_secs),
    )?;
    let (report, store) = run_pipeline(&config, Arc::new(transport)).await?;

    log_summaries(&report);

    if config.figures.enabled {
        render_figures(&config.figures, &store, &report)?;
    }

    Ok(())
}

/// Fetch, normalise and store every configured gene. An unreachable atlas is
/// an error so the process exits non-zero.
async fn run_pipeline(
    config: &config::Config,
    transport: Arc<dyn AtlasTransport>,
) -> anyhow::Result<(PipelineReport, JsonFileStore)> {
    let store = JsonFileStore::new(&config.pipeline.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.pipeline.data_dir))?;

    let pipeline = ExpressionPipeline::new(
        AllenClient::new(transport),
        store,
        tracing::info_span!("brainmap", atlas = %config.atlas.base_url),
    );

    let report = pipeline
        .run(&config.pipeline.genes)
        .await
        .with_context(|| format!("Allen Brain Atlas API unreachable at {}", config.atlas.base_url))?;

    Ok((report, pipeline.into_store()))
}

fn log_summaries(report: &PipelineReport) {
    for (gene, record) in report.saved() {
        info!("{}", ExpressionSummary::from_record(gene, record));
    }
    for outcome in &report.outcomes {
        if let brainmap_ingestion::pipeline::GeneOutcome::Skipped { gene, reason } = outcome {
            info!("{}: skipped ({})", gene, reason);
        }
    }
}

/// Per-gene figures for everything saved this run, plus one comparison chart.
/// Figure failures are logged; they never fail the run.
fn render_figures(
    figures: &config::FiguresConfig,
    store: &JsonFileStore,
    report: &PipelineReport,
) -> anyhow::Result<()> {
    let renderer = FigureRenderer::new(&figures.results_dir, figures.top_n)
        .with_context(|| format!("Failed to create results directory {:?}", figures.results_dir))?;

    let saved: Vec<String> = report.saved().map(|(gene, _)| gene.to_string()).collect();
    for gene in &saved {
        if let Err(e) = renderer.plot_stored_density(store, gene) {
            tracing::warn!(gene = %gene, "Density figure skipped: {}", e);
        }
    }

    if saved.len() > 1 {
        if let Err(e) = renderer.plot_stored_comparison(store, &saved) {
            tracing::warn!("Comparison figure skipped: {}", e);
        }
    }

    Ok(())
}
