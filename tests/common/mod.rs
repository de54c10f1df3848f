//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use login_history::models::EventLog;
use login_history::store::{EventStore, MemoryEventStore};
use tempfile::TempDir;
use tokio::sync::Barrier;

pub const DAY_MS: i64 = 24 * 3600 * 1000;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Builder for exported browser history records
pub struct HistoryRecordBuilder {
    url: Option<String>,
    title: Option<String>,
    last_visit_time: Option<f64>,
}

impl HistoryRecordBuilder {
    pub fn new(url: &str) -> Self {
        Self { url: Some(url.to_string()), title: Some(String::new()), last_visit_time: None }
    }

    pub fn without_url() -> Self {
        Self { url: None, title: Some(String::new()), last_visit_time: None }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Visit time in (possibly fractional) milliseconds, as browsers report it
    pub fn visited_at(mut self, millis: f64) -> Self {
        self.last_visit_time = Some(millis);
        self
    }

    pub fn days_ago(self, days: i64) -> Self {
        let millis = (now_ms() - days * DAY_MS) as f64;
        self.visited_at(millis)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({});
        if let Some(url) = &self.url {
            value["url"] = url.clone().into();
        }
        if let Some(title) = &self.title {
            value["title"] = title.clone().into();
        }
        if let Some(time) = self.last_visit_time {
            value["lastVisitTime"] = time.into();
        }
        value
    }
}

/// Temp directory holding a data dir and, optionally, an exported history file
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { temp_dir: TempDir::new().expect("Failed to create temp dir") }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    pub fn storage_file(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    /// Write records as a JSON array export and return its path
    pub fn with_history(&self, records: &[HistoryRecordBuilder]) -> PathBuf {
        let values: Vec<_> = records.iter().map(|r| r.to_json()).collect();
        let path = self.temp_dir.path().join("history.json");
        fs::write(&path, serde_json::to_string_pretty(&values).unwrap())
            .expect("Failed to write history file");
        path
    }

    /// Write raw content as the history file and return its path
    pub fn with_raw_history(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("history.json");
        fs::write(&path, content).expect("Failed to write history file");
        path
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Store whose reads all wait at a barrier, forcing read-read-write-write interleaving
pub struct GatedStore {
    inner: MemoryEventStore,
    gate: Barrier,
}

impl GatedStore {
    pub fn new(parties: usize) -> Self {
        Self { inner: MemoryEventStore::new(), gate: Barrier::new(parties) }
    }

    /// Current contents, bypassing the barrier
    pub async fn read_ungated(&self) -> EventLog {
        self.inner.read().await.expect("memory store read cannot fail")
    }
}

#[async_trait]
impl EventStore for GatedStore {
    async fn read(&self) -> Result<EventLog> {
        let log = self.inner.read().await?;
        self.gate.wait().await;
        Ok(log)
    }

    async fn write(&self, log: &EventLog) -> Result<()> {
        self.inner.write(log).await
    }
}

/// Store that can be switched into failing writes
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryEventStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn successful_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn read(&self) -> Result<EventLog> {
        self.inner.read().await
    }

    async fn write(&self, log: &EventLog) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.inner.write(log).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
