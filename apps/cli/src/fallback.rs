use anyhow::Result;
use clap::Subcommand;
use codify_core::{
    FallbackStore, FileFallbackStore, Summary, TelemetryConfig, TimeRange, events::unix_millis,
    format_event_line, format_summary_readable,
};
use console::style;

#[derive(Subcommand)]
pub enum FallbackCommand {
    /// List stored events, oldest first
    Show,

    /// Delete every stored event
    Clear,

    /// Aggregate stored events the way the admin dashboard does
    Summary {
        /// Include every stored event instead of the last seven days
        #[arg(long)]
        all: bool,
    },
}

pub async fn run(command: FallbackCommand, config: &TelemetryConfig) -> Result<()> {
    let store = FileFallbackStore::new(&config.fallback_path, config.fallback_capacity);

    match command {
        FallbackCommand::Show => {
            let events = store.load().await?;
            if events.is_empty() {
                println!(
                    "{} No stored events {}",
                    style("✓").green().bold(),
                    style(format!("({})", store.path().display())).dim()
                );
                return Ok(());
            }
            for event in &events {
                println!("{}", format_event_line(event));
            }
            println!(
                "\n{} {} of {} slots used",
                style("•").cyan(),
                events.len(),
                config.fallback_capacity
            );
        }
        FallbackCommand::Clear => {
            store.clear().await?;
            println!(
                "{} Cleared {}",
                style("✓").green().bold(),
                style(store.path().display()).dim()
            );
        }
        FallbackCommand::Summary { all } => {
            let events = store.load().await?;
            let range = if all {
                TimeRange {
                    start_date: 0,
                    end_date: u64::MAX,
                }
            } else {
                TimeRange::last_week(unix_millis())
            };
            println!("{}", format_summary_readable(&Summary::from_events(&events, range)));
        }
    }

    Ok(())
}
