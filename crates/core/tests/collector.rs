use std::sync::Arc;

use codify_core::{
    AmbientContext, Delivery, EventPayload, FallbackStore, HttpCollector, MemoryFallbackStore,
    NoMemoryProbe, TelemetryEvent, TelemetryHandle, Transmitter,
    events::{PerformanceMetric, SessionId},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn lcp_event() -> TelemetryEvent {
    TelemetryEvent {
        page: Some("/".to_string()),
        timestamp: 1_700_000_000_000,
        user_agent: "codify-test".to_string(),
        referrer: String::new(),
        session_id: SessionId::from("session_1700000000000_abcdefghi".to_string()),
        payload: EventPayload::PerformanceMetric(PerformanceMetric {
            metric_name: "lcp".to_string(),
            duration: 1234.0,
            memory_usage: None,
            extra: Default::default(),
        }),
    }
}

#[tokio::test]
async fn accepted_events_are_not_stored_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .and(body_partial_json(json!({
            "event": "performance_metric",
            "session_id": "session_1700000000000_abcdefghi",
            "metadata": { "metric_name": "lcp", "duration": 1234.0 }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fallback = Arc::new(MemoryFallbackStore::new(100));
    let transmitter = Transmitter::new(Arc::new(HttpCollector::new(&server.uri())), fallback.clone());

    assert_eq!(transmitter.deliver(&lcp_event()).await, Delivery::Sent);
    assert!(fallback.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_errors_fall_back_to_the_local_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let fallback = Arc::new(MemoryFallbackStore::new(100));
    let transmitter = Transmitter::new(Arc::new(HttpCollector::new(&server.uri())), fallback.clone());

    assert_eq!(transmitter.deliver(&lcp_event()).await, Delivery::StoredLocally);
    assert_eq!(fallback.load().await.unwrap(), vec![lcp_event()]);
}

#[tokio::test]
async fn pipeline_ships_every_tracked_event_before_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let fallback = Arc::new(MemoryFallbackStore::new(100));
    let handle = TelemetryHandle::start(
        AmbientContext::default(),
        Arc::new(HttpCollector::new(&server.uri())),
        fallback.clone(),
        Arc::new(NoMemoryProbe),
    );

    handle.telemetry.navigate("/servicos", "", "");
    handle.telemetry.track_conversion("whatsapp_click", None);
    handle.telemetry.track_click("cta-orcamento", None);
    handle.shutdown().await;

    assert!(fallback.load().await.unwrap().is_empty());
    server.verify().await;
}
