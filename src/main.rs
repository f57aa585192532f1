//! itemlens command-line entry point
//!
//! Runs one visual-match query (and an appraisal when materials are given)
//! and prints the resulting state as JSON.

use anyhow::Result;
use clap::Parser;
use itemlens::{config, metrics::Metrics, search::Observers, search::TracingObserver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Visual search and appraisal for scanned items
///
/// Settings are read from ITEMLENS_SETTINGS_PATH or the default locations,
/// then overridden by ITEMLENS_DEBUG, ITEMLENS_SENTINEL,
/// ITEMLENS_REQUEST_TIMEOUT and ITEMLENS_<PROVIDER>_API_KEY.
#[derive(Parser, Debug)]
#[command(name = "itemlens", version)]
struct Args {
    /// Name of the identified item
    #[arg(required = true)]
    subject: Vec<String>,

    /// Category hint for the subject
    #[arg(long)]
    category: Option<String>,

    /// Reference to the scanned image
    #[arg(long)]
    image: Option<String>,

    /// Material of the item (repeatable, enables appraisal)
    #[arg(long = "material", value_name = "NAME")]
    materials: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn subject(&self) -> String {
        self.subject.join(" ")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load(args.config.as_deref())?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting itemlens v{}", itemlens::VERSION);

    let metrics = Arc::new(Metrics::new());
    let observers = Observers::new()
        .with(Arc::new(TracingObserver))
        .with(metrics.clone());
    let orchestrator = itemlens::orchestrator_from_settings(&settings, Arc::new(observers))?;

    let subject = args.subject();
    let visual = orchestrator.fetch_visual_matches(
        &subject,
        args.category.as_deref(),
        args.image.as_deref(),
    );
    let appraisal = async {
        if args.materials.is_empty() {
            None
        } else {
            Some(orchestrator.fetch_appraisal(&subject, &args.materials).await)
        }
    };
    let (visual, appraisal) = tokio::join!(visual, appraisal);
    info!(?visual, ?appraisal, "search finished");

    for (provider, stats) in metrics.all_provider_stats() {
        info!(
            provider = %provider,
            calls = stats.calls,
            hits = stats.hits,
            failures = stats.failures,
            "provider stats"
        );
    }

    println!("{}", serde_json::to_string_pretty(&orchestrator.snapshot())?);
    Ok(())
}
