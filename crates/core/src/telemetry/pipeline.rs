use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    config::TelemetryConfig,
    events::{
        Click, Conversion, EventPayload, FormSubmission, MemoryUsage, PageView,
        PerformanceMetric, SessionId, TelemetryEvent, unix_millis,
    },
    telemetry::{Collector, FallbackStore, FileFallbackStore, HttpCollector, MemoryProbe},
    workers::Transmitter,
};

/// Browser-side context captured into every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientContext {
    pub page: Option<String>,
    pub user_agent: String,
    pub referrer: String,
}

impl AmbientContext {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            page: None,
            user_agent: config.user_agent.clone(),
            referrer: config.referrer.clone(),
        }
    }
}

/// Shared event sink for one page lifetime.
///
/// Cheap to clone; every clone appends to the same log under the same
/// session. `track*` methods never fail and never wait on the network.
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    session_id: SessionId,
    context: Mutex<AmbientContext>,
    log: Mutex<Vec<Arc<TelemetryEvent>>>,
    outbox: mpsc::UnboundedSender<Arc<TelemetryEvent>>,
    probe: Arc<dyn MemoryProbe>,
}

impl Telemetry {
    /// Creates the sink and the receiving end of its outbox.
    pub fn new(
        context: AmbientContext,
        probe: Arc<dyn MemoryProbe>,
    ) -> (Self, mpsc::UnboundedReceiver<Arc<TelemetryEvent>>) {
        let (outbox, inbox) = mpsc::unbounded_channel();

        let telemetry = Self {
            inner: Arc::new(TelemetryInner {
                session_id: SessionId::generate(),
                context: Mutex::new(context),
                log: Mutex::new(Vec::new()),
                outbox,
                probe,
            }),
        };

        (telemetry, inbox)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    pub fn current_page(&self) -> Option<String> {
        self.context().page.clone()
    }

    fn context(&self) -> std::sync::MutexGuard<'_, AmbientContext> {
        self.inner
            .context
            .lock()
            .expect("Telemetry context poisoned")
    }

    pub fn track(&self, payload: EventPayload) {
        let event = {
            let ctx = self.context();
            Arc::new(TelemetryEvent {
                page: ctx.page.clone(),
                timestamp: unix_millis(),
                user_agent: ctx.user_agent.clone(),
                referrer: ctx.referrer.clone(),
                session_id: self.inner.session_id.clone(),
                payload,
            })
        };

        self.inner
            .log
            .lock()
            .expect("Telemetry log poisoned")
            .push(Arc::clone(&event));

        if self.inner.outbox.send(event).is_err() {
            tracing::debug!("telemetry transmitter stopped; event kept in memory only");
        }
    }

    /// Free-form event; known names are decoded into their typed shape.
    pub fn track_custom(&self, name: impl Into<String>, metadata: Option<Value>) {
        self.track(EventPayload::from_parts(name, metadata));
    }

    /// Moves the ambient page and records a `page_view`.
    pub fn navigate(&self, path: impl Into<String>, search: &str, hash: &str) {
        let path = path.into();
        self.context().page = Some(path.clone());
        self.track(EventPayload::PageView(PageView {
            page: path,
            search: search.to_string(),
            hash: hash.to_string(),
            extra: Default::default(),
        }));
    }

    pub fn memory_snapshot(&self) -> Option<MemoryUsage> {
        self.inner.probe.sample()
    }

    pub fn track_performance(&self, metric_name: impl Into<String>, value: f64) {
        self.track(EventPayload::PerformanceMetric(PerformanceMetric {
            metric_name: metric_name.into(),
            duration: value,
            memory_usage: self.memory_snapshot(),
            extra: Default::default(),
        }));
    }

    pub fn track_conversion(&self, conversion_type: impl Into<String>, value: Option<f64>) {
        self.track(EventPayload::Conversion(Conversion {
            conversion_type: conversion_type.into(),
            value,
            page: self.current_page(),
            extra: Default::default(),
        }));
    }

    pub fn track_click(&self, element: impl Into<String>, extra: Option<Map<String, Value>>) {
        self.track(EventPayload::Click(Click {
            element: element.into(),
            extra: extra.unwrap_or_default(),
        }));
    }

    pub fn track_form_submission(&self, form_name: impl Into<String>, success: bool) {
        self.track(EventPayload::FormSubmission(FormSubmission {
            form_name: form_name.into(),
            success,
            page: self.current_page(),
            extra: Default::default(),
        }));
    }

    /// Snapshot of the in-memory log, in emission order.
    pub fn events(&self) -> Vec<Arc<TelemetryEvent>> {
        self.inner.log.lock().expect("Telemetry log poisoned").clone()
    }

    pub fn count_events(&self, predicate: impl Fn(&TelemetryEvent) -> bool) -> usize {
        self.inner
            .log
            .lock()
            .expect("Telemetry log poisoned")
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

/// A running pipeline: the sink plus its transmitter task.
pub struct TelemetryHandle {
    pub telemetry: Telemetry,
    shutdown_tx: broadcast::Sender<()>,
    worker: JoinHandle<()>,
}

impl TelemetryHandle {
    /// Spawns the transmitter on the current tokio runtime.
    pub fn start(
        context: AmbientContext,
        collector: Arc<dyn Collector>,
        fallback: Arc<dyn FallbackStore>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let (telemetry, inbox) = Telemetry::new(context, probe);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let transmitter = Transmitter::new(collector, fallback);
        let worker = tokio::spawn(transmitter.run(inbox, shutdown_rx));

        Self {
            telemetry,
            shutdown_tx,
            worker,
        }
    }

    /// HTTP collector and file-backed fallback, both taken from `config`.
    pub fn from_config(config: &TelemetryConfig, probe: Arc<dyn MemoryProbe>) -> Self {
        Self::start(
            AmbientContext::from_config(config),
            Arc::new(HttpCollector::new(&config.collector_url)),
            Arc::new(FileFallbackStore::new(
                &config.fallback_path,
                config.fallback_capacity,
            )),
            probe,
        )
    }

    /// Delivers whatever is still queued, then stops the transmitter.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.worker.await {
            tracing::error!("telemetry transmitter panicked: {e}");
        }
    }
}
