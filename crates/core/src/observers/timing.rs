use serde::Serialize;

use crate::{
    events::{EventPayload, PageLoadComplete, ResourceStats, SlowResource},
    telemetry::Telemetry,
};

/// Resources slower than this are reported one by one.
pub const SLOW_RESOURCE_MS: f64 = 1000.0;

/// Navigation timing marks, ms relative to time origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationTiming {
    pub fetch_start: f64,
    pub response_start: f64,
    pub load_event_end: f64,
}

impl NavigationTiming {
    pub fn ttfb(&self) -> f64 {
        self.response_start - self.fetch_start
    }

    pub fn load_time(&self) -> f64 {
        self.load_event_end - self.fetch_start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub name: String,
    pub duration: f64,
    pub initiator_type: String,
    pub transfer_size: u64,
}

/// Load-complete reporting; one report per page load.
pub struct LoadTiming {
    telemetry: Telemetry,
    reported: bool,
}

impl LoadTiming {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            telemetry,
            reported: false,
        }
    }

    /// Emits `page_load_complete` plus `ttfb`/`load_time` metrics when
    /// navigation timing is available. Later calls are ignored.
    pub fn on_load(&mut self, elapsed_ms: f64, navigation: Option<NavigationTiming>) -> bool {
        if self.reported {
            return false;
        }
        self.reported = true;

        let timing = navigation.and_then(|nav| serde_json::to_value(nav).ok());
        self.telemetry
            .track(EventPayload::PageLoadComplete(PageLoadComplete {
                load_time: elapsed_ms.round().max(0.0) as u64,
                timing,
                extra: Default::default(),
            }));

        if let Some(nav) = navigation {
            self.telemetry.track_performance("ttfb", nav.ttfb());
            self.telemetry.track_performance("load_time", nav.load_time());
        }
        true
    }
}

/// Per-resource slow reports followed by one summary.
pub fn report_resources(telemetry: &Telemetry, resources: &[ResourceEntry]) {
    for resource in resources.iter().filter(|r| r.duration > SLOW_RESOURCE_MS) {
        telemetry.track(EventPayload::SlowResource(SlowResource {
            name: resource.name.clone(),
            duration: resource.duration,
            initiator_type: resource.initiator_type.clone(),
            extra: Default::default(),
        }));
    }

    let avg_duration = if resources.is_empty() {
        0.0
    } else {
        resources.iter().map(|r| r.duration).sum::<f64>() / resources.len() as f64
    };

    telemetry.track(EventPayload::ResourceStats(ResourceStats {
        total_resources: resources.len() as u64,
        total_size: resources.iter().map(|r| r.transfer_size).sum(),
        avg_duration,
        extra: Default::default(),
    }));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::telemetry::{AmbientContext, NoMemoryProbe};

    fn telemetry() -> Telemetry {
        Telemetry::new(AmbientContext::default(), Arc::new(NoMemoryProbe)).0
    }

    #[test]
    fn load_is_reported_once_with_navigation_metrics() {
        let telemetry = telemetry();
        let mut load = LoadTiming::new(telemetry.clone());
        let nav = NavigationTiming {
            fetch_start: 10.0,
            response_start: 130.0,
            load_event_end: 1510.0,
        };

        assert!(load.on_load(1523.4, Some(nav)));
        assert!(!load.on_load(2000.0, None));

        let names: Vec<String> = telemetry
            .events()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["page_load_complete", "performance_metric", "performance_metric"]
        );
        match &telemetry.events()[0].payload {
            EventPayload::PageLoadComplete(m) => assert_eq!(m.load_time, 1523),
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(nav.ttfb(), 120.0);
        assert_eq!(nav.load_time(), 1500.0);
    }

    #[test]
    fn slow_resources_and_summary() {
        let telemetry = telemetry();
        let resources = vec![
            ResourceEntry {
                name: "/hero.webp".to_string(),
                duration: 1800.0,
                initiator_type: "img".to_string(),
                transfer_size: 300,
            },
            ResourceEntry {
                name: "/app.js".to_string(),
                duration: 200.0,
                initiator_type: "script".to_string(),
                transfer_size: 100,
            },
        ];

        report_resources(&telemetry, &resources);

        let events = telemetry.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1].payload,
            EventPayload::ResourceStats(ResourceStats {
                total_resources: 2,
                total_size: 400,
                avg_duration: 1000.0,
                extra: Default::default(),
            })
        );
    }

    #[test]
    fn no_resources_gives_a_zero_average() {
        let telemetry = telemetry();
        report_resources(&telemetry, &[]);

        match &telemetry.events()[0].payload {
            EventPayload::ResourceStats(stats) => assert_eq!(stats.avg_duration, 0.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
