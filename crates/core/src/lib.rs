//! Client telemetry pipeline and quote request wizard for the codify site.

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod ingest;
pub mod observers;
pub mod queues;
pub mod quote;
pub mod telemetry;
pub mod workers;

pub use config::{BackendConfig, ConfigError, TelemetryConfig, default_fallback_path};
pub use error::{CodifyError, Result};
pub use events::{EventPayload, SessionId, TelemetryEvent};
pub use format::{format_duration, format_event_line, format_quote_readable, format_summary_readable};
pub use ingest::{DerivedMetric, IngestError, Summary, TimeRange, derive_metric, ingest};
pub use observers::{EntryType, PageMonitor};
pub use quote::{
    Attachment, BackendSubmitter, Field, LeadId, ProjectCapture, QuoteRequest, QuoteSubmitter,
    QuoteWizard, SubmitOutcome, WizardState,
};
pub use telemetry::{
    AmbientContext, Collector, FallbackStore, FileFallbackStore, HttpCollector,
    MemoryFallbackStore, MemoryProbe, NoMemoryProbe, Telemetry, TelemetryHandle,
};
pub use workers::{Delivery, Transmitter};
