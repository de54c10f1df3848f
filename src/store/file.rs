//! File-backed key-value storage for the event log
//!
//! The storage file is a JSON object standing in for the browser's key-value
//! store. The whole log lives under [`LOGIN_STORAGE_KEY`]; other keys are kept
//! as-is on write. Writes are atomic: each one goes to its own temp file, which is then
//! renamed over the storage file.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::fs;

use super::EventStore;
use crate::models::{EventLog, LoginEvent};

/// Storage key holding the login log; the suffix is the only format tag
pub const LOGIN_STORAGE_KEY: &str = "login_events_v1";

const STORAGE_FILENAME: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct FileEventStore {
    path: PathBuf,
}

impl FileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/storage.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read storage file: {}", self.path.display())
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse storage file: {}", self.path.display()))?
        {
            Value::Object(map) => Ok(map),
            _ => bail!("Storage file is not a JSON object: {}", self.path.display()),
        }
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn read(&self) -> Result<EventLog> {
        let mut document = self.load_document().await?;

        let items = match document.remove(LOGIN_STORAGE_KEY) {
            None | Some(Value::Null) => return Ok(EventLog::new()),
            Some(Value::Array(items)) => items,
            Some(_) => bail!("Stored value under '{}' is not a list", LOGIN_STORAGE_KEY),
        };

        let mut events = Vec::with_capacity(items.len());
        let mut dropped = 0;
        for item in items {
            match serde_json::from_value::<LoginEvent>(item) {
                Ok(event) => events.push(event),
                Err(e) => {
                    log::warn!("Dropping invalid stored login event: {}", e);
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            log::info!("Loaded {} stored login events ({} dropped)", events.len(), dropped);
        }

        Ok(EventLog::from_events(events))
    }

    async fn write(&self, log: &EventLog) -> Result<()> {
        let mut document = self.load_document().await?;
        document.insert(
            LOGIN_STORAGE_KEY.to_string(),
            serde_json::to_value(log).context("Failed to serialize login events")?,
        );

        let json = serde_json::to_string_pretty(&Value::Object(document))
            .context("Failed to serialize storage document")?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, json.as_bytes()))
            .await
            .context("Storage write task failed")??;

        Ok(())
    }
}

/// Write `contents` to a temp file next to `path`, then rename it into place
///
/// Every call gets its own temp file, so concurrent writers never share one.
fn persist_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create storage directory: {}", parent.display()))?;

    let mut temp = NamedTempFile::new_in(parent).context("Failed to create storage temp file")?;
    temp.write_all(contents).context("Failed to write storage temp file")?;
    temp.persist(path).context("Failed to rename storage temp file")?;

    Ok(())
}
