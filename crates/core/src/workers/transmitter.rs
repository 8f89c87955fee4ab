use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::{
    events::TelemetryEvent,
    telemetry::{Collector, FallbackStore},
};

/// What happened to one event on its way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    StoredLocally,
    Dropped,
}

/// Drains the telemetry outbox into the collector, spilling failures into
/// the fallback store.
pub struct Transmitter {
    collector: Arc<dyn Collector>,
    fallback: Arc<dyn FallbackStore>,
}

impl Transmitter {
    pub const SUBSCRIBER_ID: &'static str = "telemetry.transmitter";

    pub fn new(collector: Arc<dyn Collector>, fallback: Arc<dyn FallbackStore>) -> Self {
        Self {
            collector,
            fallback,
        }
    }

    /// One send attempt, no retry. Every failure ends in a log line.
    pub async fn deliver(&self, event: &TelemetryEvent) -> Delivery {
        let Err(send_err) = self.collector.send(event).await else {
            return Delivery::Sent;
        };

        tracing::debug!(
            subscriber = Self::SUBSCRIBER_ID,
            event = event.name(),
            error = %send_err,
            "collector unavailable; keeping event locally"
        );

        match self.fallback.append(event).await {
            Ok(()) => Delivery::StoredLocally,
            Err(store_err) => {
                tracing::warn!(
                    subscriber = Self::SUBSCRIBER_ID,
                    event = event.name(),
                    error = %store_err,
                    "fallback store write failed; event dropped"
                );
                Delivery::Dropped
            }
        }
    }

    /// Runs until shutdown or until every outbox sender is gone. Events
    /// already queued at shutdown are still delivered.
    pub async fn run(
        self,
        mut inbox: mpsc::UnboundedReceiver<Arc<TelemetryEvent>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    while let Ok(event) = inbox.try_recv() {
                        self.deliver(&event).await;
                    }
                    return;
                }
                next = inbox.recv() => match next {
                    Some(event) => {
                        self.deliver(&event).await;
                    }
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        events::{EventPayload, SessionId},
        telemetry::{MemoryFallbackStore, TelemetryError},
    };

    struct FailingCollector;

    #[async_trait]
    impl Collector for FailingCollector {
        async fn send(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Rejected { status: 503 })
        }
    }

    #[derive(Default)]
    struct RecordingCollector {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Collector for RecordingCollector {
        async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
            self.seen.lock().unwrap().push(event.name().to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl FallbackStore for BrokenStore {
        async fn append(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Storage(std::io::Error::other("disk full")))
        }
        async fn load(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
            Ok(Vec::new())
        }
        async fn clear(&self) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    fn event(name: &str) -> TelemetryEvent {
        TelemetryEvent {
            page: None,
            timestamp: 1,
            user_agent: String::new(),
            referrer: String::new(),
            session_id: SessionId::from("session_1_x".to_string()),
            payload: EventPayload::Custom {
                name: name.to_string(),
                metadata: None,
            },
        }
    }

    #[tokio::test]
    async fn rejected_events_land_in_the_fallback() {
        let store = Arc::new(MemoryFallbackStore::new(100));
        let transmitter = Transmitter::new(Arc::new(FailingCollector), store.clone());

        assert_eq!(
            transmitter.deliver(&event("a")).await,
            Delivery::StoredLocally
        );
        assert_eq!(store.load().await.unwrap(), vec![event("a")]);
    }

    #[tokio::test]
    async fn fallback_failure_is_swallowed() {
        let transmitter = Transmitter::new(Arc::new(FailingCollector), Arc::new(BrokenStore));
        assert_eq!(transmitter.deliver(&event("a")).await, Delivery::Dropped);
    }

    #[tokio::test]
    async fn shutdown_drains_queued_events_in_order() {
        let collector = Arc::new(RecordingCollector::default());
        let transmitter = Transmitter::new(collector.clone(), Arc::new(MemoryFallbackStore::new(4)));
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        for name in ["first", "second", "third"] {
            tx.send(Arc::new(event(name))).unwrap();
        }
        shutdown_tx.send(()).unwrap();

        transmitter.run(rx, shutdown_rx).await;

        assert_eq!(
            *collector.seen.lock().unwrap(),
            vec!["first", "second", "third"]
        );
    }
}
