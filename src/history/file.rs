use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use super::{HistoryProvider, apply_query};
use crate::models::{HistoryQuery, HistoryRecord};
use crate::parsers::parse_history_file;

/// History read from an exported history file (JSON array or JSON Lines)
///
/// The file is re-read on every search so a refreshed export is picked up
/// without restarting the coordinator.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryProvider for FileHistory {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>> {
        let path = self.path.clone();
        let records = tokio::task::spawn_blocking(move || parse_history_file(&path)).await??;
        Ok(apply_query(&records, query))
    }
}
