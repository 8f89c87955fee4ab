use thiserror::Error;

use crate::{
    config::ConfigError,
    events::DecodeError,
    ingest::IngestError,
    observers::ObserverError,
    quote::{CaptureError, SubmitError, WizardError},
    telemetry::TelemetryError,
};

#[derive(Error, Debug)]
pub enum CodifyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error("Event decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Lead capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodifyError>;
