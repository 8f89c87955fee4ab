//! Collector side of the analytics endpoint: request validation, derived
//! business/performance metrics and the admin summary.

pub mod summary;

pub use summary::*;

use serde::Serialize;
use serde_json::Value;

use crate::events::{DecodeError, EventPayload, RawEvent, SessionId, TelemetryEvent};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Rejected event: {0}")]
    Rejected(#[from] DecodeError),

    #[error("Malformed event body: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl IngestError {
    /// HTTP status the endpoint answers with.
    pub fn status(&self) -> u16 {
        400
    }
}

/// Validates a request body. `event`, `timestamp` and `session_id` are required.
pub fn ingest(body: Value) -> Result<TelemetryEvent, IngestError> {
    let raw: RawEvent = serde_json::from_value(body)?;
    Ok(TelemetryEvent::try_from(raw)?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum DerivedMetric {
    BusinessMetric {
        metric_type: &'static str,
        metric_name: String,
        value: f64,
        timestamp: u64,
        session_id: SessionId,
    },
    PerformanceMetric {
        metric_name: String,
        value: f64,
        timestamp: u64,
        session_id: SessionId,
        page: Option<String>,
    },
}

/// Secondary metric row for an accepted event, if its kind has one.
pub fn derive_metric(event: &TelemetryEvent) -> Option<DerivedMetric> {
    match &event.payload {
        EventPayload::Conversion(conversion) => Some(DerivedMetric::BusinessMetric {
            metric_type: "conversion",
            metric_name: non_empty_or_unknown(&conversion.conversion_type),
            value: conversion.value.unwrap_or(1.0),
            timestamp: event.timestamp,
            session_id: event.session_id.clone(),
        }),
        EventPayload::PerformanceMetric(metric) => Some(DerivedMetric::PerformanceMetric {
            metric_name: non_empty_or_unknown(&metric.metric_name),
            value: metric.duration,
            timestamp: event.timestamp,
            session_id: event.session_id.clone(),
            page: event.page.clone(),
        }),
        EventPayload::PageView(_)
        | EventPayload::PageLoadComplete(_)
        | EventPayload::PageEngagement(_)
        | EventPayload::PageHidden(_)
        | EventPayload::JavascriptError(_)
        | EventPayload::PromiseRejection(_)
        | EventPayload::Click(_)
        | EventPayload::FormSubmission(_)
        | EventPayload::SlowResource(_)
        | EventPayload::ResourceStats(_)
        | EventPayload::RageClicks(_)
        | EventPayload::Custom { .. } => None,
    }
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.is_empty() {
        "unknown".to_string()
    } else {
        value.to_string()
    }
}
