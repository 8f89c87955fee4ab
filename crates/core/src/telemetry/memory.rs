use crate::events::MemoryUsage;

/// Source of heap usage snapshots, when the host runtime exposes them.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> Option<MemoryUsage>;
}

/// Host without memory statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn sample(&self) -> Option<MemoryUsage> {
        None
    }
}

impl<F> MemoryProbe for F
where
    F: Fn() -> Option<MemoryUsage> + Send + Sync,
{
    fn sample(&self) -> Option<MemoryUsage> {
        self()
    }
}
