//! Retrospective login detection over browsing history
//!
//! [`HistoryScanner::scan`] queries the history capability for a lookback
//! window and turns every record whose URL or title carries authentication
//! vocabulary into a `history_keyword` [`LoginEvent`]. The result is one batch,
//! merged by the Aggregator in a single read-modify-write.

pub mod keywords;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use keywords::{LOGIN_KEYWORDS, contains_login_keyword, is_login_related};

use crate::history::{DEFAULT_MAX_RESULTS, HistoryProvider};
use crate::models::{HistoryQuery, HistoryRecord, LoginEvent, LoginMethod, hostname_of};
use crate::utils::{days_before, now_millis};

/// Lookback window used when the caller gives none (or a non-positive one)
pub const DEFAULT_SCAN_DAYS: i64 = 365;

/// Resolve the requested lookback window
pub fn effective_days(days: Option<i64>) -> i64 {
    match days {
        Some(days) if days > 0 => days,
        _ => DEFAULT_SCAN_DAYS,
    }
}

/// Turn matching history records into candidate events
///
/// Records without a URL, or whose URL has no parsable hostname, are skipped
/// individually. Records without a visit time are stamped with `now`.
pub fn classify(records: &[HistoryRecord], now: i64) -> Vec<LoginEvent> {
    let mut events = Vec::new();
    let mut skipped = 0;

    for record in records.iter().filter(|r| is_login_related(r)) {
        let Some(url) = record.url.as_deref() else {
            skipped += 1;
            continue;
        };

        match hostname_of(url) {
            Ok(domain) => events.push(LoginEvent {
                domain,
                url: url.to_string(),
                timestamp: record.last_visit_time.unwrap_or(now),
                method: LoginMethod::HistoryKeyword,
            }),
            Err(e) => {
                log::warn!("Skipping history record: {:#}", e);
                skipped += 1;
            }
        }
    }

    log::debug!("Classified {} login events from history ({} skipped)", events.len(), skipped);

    events
}

pub struct HistoryScanner {
    history: Arc<dyn HistoryProvider>,
    max_results: usize,
}

impl HistoryScanner {
    pub fn new(history: Arc<dyn HistoryProvider>) -> Self {
        Self { history, max_results: DEFAULT_MAX_RESULTS }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Scan the last `days` of history (see [`effective_days`]) for login events
    pub async fn scan(&self, days: Option<i64>) -> Result<Vec<LoginEvent>> {
        let days = effective_days(days);
        let now = now_millis();
        let query = HistoryQuery {
            text: String::new(),
            start_time: days_before(now, days),
            end_time: Some(now),
            max_results: self.max_results,
        };

        let records = self.history.search(&query).await.context("History search failed")?;
        log::debug!("History search over {} days returned {} records", days, records.len());

        Ok(classify(&records, now))
    }
}
