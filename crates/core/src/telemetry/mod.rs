//! Client telemetry: event construction, in-memory log, transmission to the
//! collector and durable fallback for undelivered events.

pub mod collector;
pub mod fallback;
pub mod memory;
pub mod pipeline;

pub use collector::*;
pub use fallback::*;
pub use memory::*;
pub use pipeline::*;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Collector request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Collector rejected event with status {status}")]
    Rejected { status: u16 },

    #[error("Fallback store IO error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Event encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
