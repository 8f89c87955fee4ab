//! Observation sources feeding the telemetry pipeline. Each one is a plain
//! aggregator driven by host callbacks.

pub mod engagement;
pub mod errors;
pub mod memory_sampler;
pub mod rage_clicks;
pub mod timing;
pub mod web_vitals;

use std::time::Duration;

pub use engagement::*;
pub use errors::*;
pub use memory_sampler::*;
pub use rage_clicks::*;
pub use timing::*;
pub use web_vitals::*;

use crate::telemetry::Telemetry;

#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("Performance entry type {0} is not supported by this host")]
    Unsupported(&'static str),
}

/// Every observer for one page, set up together and torn down together.
pub struct PageMonitor {
    pub vitals: WebVitals,
    pub engagement: Engagement,
    pub load: LoadTiming,
    pub rage_clicks: RageClickDetector,
    pub errors: ErrorReporter,
    sampler: Option<MemorySampler>,
}

impl PageMonitor {
    /// Must be called inside a tokio runtime; the memory sampler is a task.
    pub fn start(telemetry: &Telemetry, supported: &[EntryType], sample_every: Duration) -> Self {
        let mut vitals = WebVitals::new(telemetry.clone());
        vitals.observe_all(supported);

        Self {
            vitals,
            engagement: Engagement::new(telemetry.clone()),
            load: LoadTiming::new(telemetry.clone()),
            rage_clicks: RageClickDetector::new(telemetry.clone()),
            errors: ErrorReporter::new(telemetry.clone()),
            sampler: Some(MemorySampler::start(telemetry.clone(), sample_every)),
        }
    }

    /// Disconnects the vitals observers and cancels memory sampling.
    pub fn teardown(mut self) {
        self.vitals.disconnect();
        if let Some(sampler) = self.sampler.take() {
            sampler.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        events::MemoryUsage,
        telemetry::AmbientContext,
    };

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_vitals_and_sampling() {
        let probe = || {
            Some(MemoryUsage {
                used: 1,
                total: 1,
                limit: 1,
            })
        };
        let (telemetry, _inbox) = Telemetry::new(AmbientContext::default(), Arc::new(probe));
        let monitor = PageMonitor::start(&telemetry, &EntryType::ALL, Duration::from_secs(30));
        assert!(monitor.vitals.is_observing(EntryType::LayoutShift));

        tokio::time::sleep(Duration::from_secs(1)).await;
        monitor.teardown();
        let before = telemetry.events().len();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(telemetry.events().len(), before);
        assert_eq!(before, 1);
    }
}
