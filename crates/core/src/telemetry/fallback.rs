use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use tokio::fs;

use crate::{events::TelemetryEvent, queues::FifoDropOldestQueue, telemetry::TelemetryError};

/// Local store for events the collector did not accept.
///
/// Holds at most `capacity` events; appending to a full store evicts the
/// oldest entry.
#[async_trait]
pub trait FallbackStore: Send + Sync {
    async fn append(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
    async fn load(&self) -> Result<Vec<TelemetryEvent>, TelemetryError>;
    async fn clear(&self) -> Result<(), TelemetryError>;
}

/// JSON array file, rewritten on every append.
///
/// Read-modify-write cycles are serialized through an async lock so two
/// failed deliveries can't drop each other's update.
pub struct FileFallbackStore {
    path: PathBuf,
    capacity: usize,
    lock: tokio::sync::Mutex<()>,
}

impl FileFallbackStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        assert!(capacity > 0);

        Self {
            path: path.into(),
            capacity,
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty log. A file that no longer parses is
    /// moved aside to `<file>.corrupt` and also reads as empty; any other I/O
    /// failure is returned so the caller never rewrites over it.
    async fn read_entries(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let aside = self.sibling("corrupt");
                fs::rename(&self.path, &aside).await?;
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "fallback store corrupt; starting over"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Writes a sibling temp file and renames it over the log, so a crash
    /// mid-write leaves the previous log in place.
    async fn write_entries(&self, entries: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(entries)?;
        let tmp = self.sibling("tmp");
        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl FallbackStore for FileFallbackStore {
    async fn append(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let _guard = self.lock.lock().await;

        let mut log = FifoDropOldestQueue::from_vec(self.capacity, self.read_entries().await?);
        log.push_overwrite(event.clone());

        self.write_entries(&log.into_vec()).await
    }

    async fn load(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }

    async fn clear(&self) -> Result<(), TelemetryError> {
        let _guard = self.lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, for hosts without a writable filesystem.
pub struct MemoryFallbackStore {
    entries: Mutex<FifoDropOldestQueue<TelemetryEvent>>,
}

impl MemoryFallbackStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(FifoDropOldestQueue::new(capacity)),
        }
    }
}

#[async_trait]
impl FallbackStore for MemoryFallbackStore {
    async fn append(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.entries
            .lock()
            .expect("MemoryFallbackStore poisoned")
            .push_overwrite(event.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        Ok(self
            .entries
            .lock()
            .expect("MemoryFallbackStore poisoned")
            .iter()
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<(), TelemetryError> {
        self.entries
            .lock()
            .expect("MemoryFallbackStore poisoned")
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::events::{EventPayload, SessionId};

    fn numbered(n: u64) -> TelemetryEvent {
        TelemetryEvent {
            page: Some("/".to_string()),
            timestamp: 1_000 + n,
            user_agent: "test".to_string(),
            referrer: String::new(),
            session_id: SessionId::from("session_1_test".to_string()),
            payload: EventPayload::Custom {
                name: format!("event_{n}"),
                metadata: None,
            },
        }
    }

    #[tokio::test]
    async fn file_store_keeps_the_most_recent_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::new(dir.path().join("analytics_events.json"), 100);

        for n in 0..150 {
            store.append(&numbered(n)).await.unwrap();
        }

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 100);
        assert_eq!(entries.first().unwrap().name(), "event_50");
        assert_eq!(entries.last().unwrap().name(), "event_149");
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.json");

        FileFallbackStore::new(&path, 10)
            .append(&numbered(1))
            .await
            .unwrap();

        let reopened = FileFallbackStore::new(&path, 10);
        assert_eq!(reopened.load().await.unwrap(), vec![numbered(1)]);
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileFallbackStore::new(&path, 10);
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(
            std::fs::read(dir.path().join("events.json.corrupt")).unwrap(),
            b"not json"
        );

        store.append(&numbered(7)).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![numbered(7)]);
    }

    #[tokio::test]
    async fn unreadable_log_fails_append_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"data").unwrap();

        let store = FileFallbackStore::new(&path, 10);
        assert!(store.append(&numbered(1)).await.is_err());
        assert!(store.load().await.is_err());
        assert_eq!(std::fs::read(path.join("keep")).unwrap(), b"data");
        assert!(!dir.path().join("events.json.corrupt").exists());
    }

    #[tokio::test]
    async fn append_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::new(dir.path().join("events.json"), 10);

        store.append(&numbered(1)).await.unwrap();
        store.append(&numbered(2)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["events.json"]);
        assert_eq!(store.load().await.unwrap(), vec![numbered(1), numbered(2)]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::new(dir.path().join("events.json"), 10);

        store.clear().await.unwrap();
        store.append(&numbered(1)).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_store_drops_oldest() {
        let store = MemoryFallbackStore::new(2);
        for n in 0..5 {
            store.append(&numbered(n)).await.unwrap();
        }

        let names: Vec<String> = store
            .load()
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["event_3", "event_4"]);
    }
}
