//! Aggregate views over an event log snapshot
//!
//! These are the numbers behind the per-domain and per-day charts; rendering
//! them is left to the presentation layer.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::models::{LoginEvent, LoginMethod};

/// Default number of domains reported by [`domain_counts`]
pub const DEFAULT_TOP_DOMAINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Logins per domain, most frequent first, ties by domain name, at most `limit`
pub fn domain_counts<'a>(
    events: impl IntoIterator<Item = &'a LoginEvent>,
    limit: usize,
) -> Vec<DomainCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.domain.as_str()).or_default() += 1;
    }

    let mut result: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount { domain: domain.to_string(), count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    result.truncate(limit);
    result
}

/// Logins per UTC calendar day, oldest first
///
/// Events whose timestamp falls outside chrono's range are left out.
pub fn daily_counts<'a>(events: impl IntoIterator<Item = &'a LoginEvent>) -> Vec<DailyCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for event in events {
        if let Some(timestamp) = DateTime::from_timestamp_millis(event.timestamp) {
            *counts.entry(timestamp.date_naive()).or_default() += 1;
        }
    }

    let mut result: Vec<DailyCount> =
        counts.into_iter().map(|(date, count)| DailyCount { date, count }).collect();
    result.sort_by_key(|d| d.date);
    result
}

/// Everything the `stats` view needs, computed in one pass over a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub detected: usize,
    pub history_keyword: usize,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
    pub top_domains: Vec<DomainCount>,
    pub per_day: Vec<DailyCount>,
}

impl Summary {
    pub fn from_events(events: &[LoginEvent], top: usize) -> Self {
        let detected = events.iter().filter(|e| e.method == LoginMethod::Detected).count();

        Self {
            total: events.len(),
            detected,
            history_keyword: events.len() - detected,
            oldest: events.iter().map(|e| e.timestamp).min(),
            newest: events.iter().map(|e| e.timestamp).max(),
            top_domains: domain_counts(events, top),
            per_day: daily_counts(events),
        }
    }
}
