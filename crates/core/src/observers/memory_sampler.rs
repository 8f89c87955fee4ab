use std::time::Duration;

use tokio::task::JoinHandle;

use crate::telemetry::Telemetry;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic `memory_usage` metric. Sampling stops when the sampler is
/// stopped or dropped.
pub struct MemorySampler {
    task: JoinHandle<()>,
}

impl MemorySampler {
    /// Intervals shorter than a millisecond are raised to one.
    pub fn start(telemetry: Telemetry, every: Duration) -> Self {
        let every = every.max(MIN_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Some(usage) = telemetry.memory_snapshot() {
                    telemetry.track_performance("memory_usage", usage.used as f64);
                }
            }
        });

        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
