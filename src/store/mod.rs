//! Event log persistence
//!
//! The Aggregator never touches storage directly; it holds an [`EventStore`]
//! and performs every operation as a full `read` → transform → `write` cycle.
//! Nothing serializes those cycles: two handlers that read before either writes
//! will lose one update (last write wins on the whole log).
//!
//! Implementations:
//! - [`MemoryEventStore`]: process-local, for tests and embedding
//! - [`FileEventStore`]: one JSON document on disk, the log under a single key

pub mod file;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

pub use file::{FileEventStore, LOGIN_STORAGE_KEY};

use crate::models::EventLog;

/// Repository holding the single event log
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Read the whole log; an absent log reads as empty
    async fn read(&self) -> Result<EventLog>;

    /// Replace the whole log
    async fn write(&self, log: &EventLog) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    log: RwLock<EventLog>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self { log: RwLock::new(log) }
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn read(&self) -> Result<EventLog> {
        Ok(self.log.read().await.clone())
    }

    async fn write(&self, log: &EventLog) -> Result<()> {
        *self.log.write().await = log.clone();
        Ok(())
    }
}
