//! Browsing-history capability
//!
//! The scanner and the `export_history` message only see history through
//! [`HistoryProvider`]. Both bundled providers share the browser's search
//! semantics, implemented once in [`apply_query`]:
//!
//! - `text` is a case-insensitive substring match on URL or title (empty matches all)
//! - records visited before `start_time` (or after `end_time`) are excluded;
//!   records without a visit time are kept
//! - results are ordered most recent first and capped at `max_results`

pub mod file;

use anyhow::Result;
use async_trait::async_trait;

pub use file::FileHistory;

use crate::models::{HistoryQuery, HistoryRecord};

/// Default result cap for history searches, a platform ceiling rather than a domain limit
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>>;
}

/// Filter, order and cap `records` according to `query`
pub fn apply_query(records: &[HistoryRecord], query: &HistoryQuery) -> Vec<HistoryRecord> {
    let needle = query.text.trim().to_lowercase();

    let mut matched: Vec<HistoryRecord> = records
        .iter()
        .filter(|record| match record.last_visit_time {
            Some(visited) => {
                visited >= query.start_time && query.end_time.is_none_or(|end| visited <= end)
            }
            None => true,
        })
        .filter(|record| {
            needle.is_empty()
                || [&record.url, &record.title]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    // Most recent first; stable so equal times keep source order
    matched.sort_by(|a, b| b.last_visit_time.cmp(&a.last_visit_time));
    matched.truncate(query.max_results);
    matched
}

/// In-memory history, for tests and hosts that push records in directly
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    records: Vec<HistoryRecord>,
}

impl StaticHistory {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl HistoryProvider for StaticHistory {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>> {
        Ok(apply_query(&self.records, query))
    }
}
