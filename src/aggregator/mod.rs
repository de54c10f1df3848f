//! The coordinator: sole writer of the event log
//!
//! # Consistency model
//!
//! The Aggregator keeps no state between calls. Each operation reads the log
//! from the [`EventStore`], transforms it and writes it back, so the process
//! backing it can be dropped and recreated between any two messages.
//!
//! Nothing serializes concurrent operations. Two handlers that both read
//! before either writes lose one update; that costs completeness of an
//! approximate signal and is accepted. Within one operation steps run in
//! order; across operations there is no ordering.
//!
//! Both `record` and `merge_batch` go through [`EventLog::merge`], so the
//! `(url, timestamp)` uniqueness of the log holds whenever writers do not race.

mod service;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::history::{DEFAULT_MAX_RESULTS, HistoryProvider};
use crate::messaging::{ExportHistoryParams, Request, Response, ScanParams};
use crate::models::{EventLog, HistoryQuery, HistoryRecord, LoginEvent};
use crate::scanner::{DEFAULT_SCAN_DAYS, HistoryScanner};
use crate::store::EventStore;
use crate::utils::{days_before, now_millis};

pub struct Aggregator {
    store: Arc<dyn EventStore>,
    history: Arc<dyn HistoryProvider>,
    scanner: HistoryScanner,
}

impl Aggregator {
    pub fn new(store: Arc<dyn EventStore>, history: Arc<dyn HistoryProvider>) -> Self {
        let scanner = HistoryScanner::new(Arc::clone(&history));
        Self { store, history, scanner }
    }

    /// Append one candidate event (from a page detector)
    pub async fn record(&self, event: LoginEvent) -> Result<()> {
        event.validate().context("Rejected login report")?;
        let url = event.url.clone();
        self.merge_batch(vec![event]).await?;
        log::debug!("Recorded login at {}", url);
        Ok(())
    }

    /// Merge a batch of candidates in one read-modify-write
    ///
    /// Existing entries win over candidates with the same `(url, timestamp)`.
    /// Returns the number of candidates offered, not the net growth of the log.
    pub async fn merge_batch(&self, candidates: Vec<LoginEvent>) -> Result<usize> {
        let mut log = self.store.read().await.context("Failed to read login events")?;
        let before = log.len();
        let offered = log.merge(candidates);

        self.store.write(&log).await.context("Failed to write login events")?;
        log::debug!(
            "Merged {} candidate(s): log grew from {} to {} events",
            offered,
            before,
            log.len()
        );

        Ok(offered)
    }

    /// Snapshot of the current log
    pub async fn query(&self) -> Result<EventLog> {
        self.store.read().await.context("Failed to read login events")
    }

    /// Raw history records for export, with the browser-export defaults
    pub async fn export_history(&self, params: ExportHistoryParams) -> Result<Vec<HistoryRecord>> {
        let now = now_millis();
        let days = params.start_time_days.unwrap_or(DEFAULT_SCAN_DAYS);
        let query = HistoryQuery {
            text: params.text.unwrap_or_default(),
            start_time: days_before(now, days),
            end_time: None,
            max_results: params.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        };

        self.history.search(&query).await.context("History export failed")
    }

    /// Classify recent history and merge the matches; returns the batch size
    pub async fn scan_history_keywords(&self, days: Option<i64>) -> Result<usize> {
        let candidates = self.scanner.scan(days).await?;
        self.merge_batch(candidates).await
    }

    /// Execute one message and build its reply
    pub async fn handle(&self, request: Request) -> Result<Response> {
        match request {
            Request::ReportLogin(event) => {
                self.record(event).await?;
                Ok(Response::Ack { ok: true })
            }
            Request::GetLogins => {
                let log = self.query().await?;
                Ok(Response::Logins { events: log.into_events() })
            }
            Request::ExportHistory(params) => {
                let history = self.export_history(params.unwrap_or_default()).await?;
                Ok(Response::History { history })
            }
            Request::ScanHistoryKeywords(params) => {
                let days = params.unwrap_or_default().days;
                let added = self.scan_history_keywords(days).await?;
                Ok(Response::Scanned { ok: true, added })
            }
        }
    }
}
