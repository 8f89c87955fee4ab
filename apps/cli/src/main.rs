use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use codify_core::{
    AmbientContext, EventPayload, FallbackStore, FileFallbackStore, HttpCollector, NoMemoryProbe,
    TelemetryConfig, TelemetryHandle,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use crate::{fallback::FallbackCommand, quote::QuoteArgs};

mod fallback;
mod quote;

#[derive(Parser)]
#[command(name = "codify")]
#[command(about = "Emit telemetry events, drive the quote wizard and inspect the fallback store")]
struct Cli {
    /// Collector base URL (overrides CODIFY_COLLECTOR_URL)
    #[arg(long, global = true)]
    collector_url: Option<String>,

    /// Durable fallback file (overrides CODIFY_FALLBACK_PATH)
    #[arg(long, global = true)]
    fallback_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit one event and wait for delivery
    Track {
        /// Event name, e.g. "page_view" or "conversion"
        event: String,

        /// Page path recorded on the event
        #[arg(short, long)]
        page: Option<String>,

        /// Metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Emit a performance metric
    Perf {
        metric: String,
        value: f64,

        #[arg(short, long)]
        page: Option<String>,
    },

    /// Fill in and submit a quote request
    Quote(QuoteArgs),

    /// Inspect the durable fallback store
    Fallback {
        #[command(subcommand)]
        command: FallbackCommand,
    },
}

pub(crate) fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn load_config(cli: &Cli) -> Result<TelemetryConfig> {
    let mut config = TelemetryConfig::from_env()?;
    if let Some(url) = &cli.collector_url {
        config.collector_url = url.clone();
    }
    if let Some(path) = &cli.fallback_path {
        config.fallback_path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Pipeline against the configured collector, with `page` as the current page.
pub(crate) fn start_pipeline(config: &TelemetryConfig, page: Option<String>) -> TelemetryHandle {
    let context = AmbientContext {
        page,
        ..AmbientContext::from_config(config)
    };
    TelemetryHandle::start(
        context,
        Arc::new(HttpCollector::new(&config.collector_url)),
        Arc::new(FileFallbackStore::new(
            &config.fallback_path,
            config.fallback_capacity,
        )),
        Arc::new(NoMemoryProbe),
    )
}

/// Drains the pipeline and reports how many events ended up stored locally.
pub(crate) async fn finish_pipeline(
    handle: TelemetryHandle,
    config: &TelemetryConfig,
) -> Result<()> {
    let store = FileFallbackStore::new(&config.fallback_path, config.fallback_capacity);
    let before = store.load().await?;
    let emitted = handle.telemetry.events().len();

    let spinner = create_spinner("Delivering events...")?;
    handle.shutdown().await;
    let after = store.load().await?;

    // The store is capped, so compare the newest entries rather than counts.
    let stored = after
        .iter()
        .rev()
        .take_while(|e| !before.contains(e))
        .count();

    if stored == 0 {
        spinner.finish_with_message(format!(
            "{} Delivered {} event(s) to {}",
            style("✓").green().bold(),
            emitted,
            style(&config.collector_url).dim()
        ));
    } else {
        spinner.finish_with_message(format!(
            "{} {} of {} event(s) stored locally {}",
            style("!").yellow().bold(),
            stored,
            emitted,
            style(format!("({})", config.fallback_path.display())).dim()
        ));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Track {
            event,
            page,
            metadata,
        } => {
            let metadata = metadata
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()?;
            let handle = start_pipeline(&config, page);
            let session = handle.telemetry.session_id().clone();
            handle.telemetry.track(EventPayload::from_parts(event, metadata));
            println!(
                "{} Session {}",
                style("•").cyan(),
                style(session).dim()
            );
            finish_pipeline(handle, &config).await?;
        }
        Command::Perf {
            metric,
            value,
            page,
        } => {
            let handle = start_pipeline(&config, page);
            handle.telemetry.track_performance(metric, value);
            finish_pipeline(handle, &config).await?;
        }
        Command::Quote(args) => quote::run(args, &config).await?,
        Command::Fallback { command } => fallback::run(command, &config).await?,
    }

    Ok(())
}
