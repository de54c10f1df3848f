use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where a login event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    /// Observed live: a password-bearing form was submitted
    Detected,
    /// Inferred after the fact from history text matching
    HistoryKeyword,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Detected => "detected",
            LoginMethod::HistoryKeyword => "history_keyword",
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_non_empty")]
    pub domain: String,
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_non_empty")]
    pub url: String,
    /// Milliseconds since the Unix epoch
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_millis")]
    pub timestamp: i64,
    pub method: LoginMethod,
}

impl LoginEvent {
    /// Build a `detected` event for a page URL, attributing it to the URL's hostname
    pub fn detected(url: &str, timestamp: i64) -> Result<Self> {
        let domain = hostname_of(url)?;
        Ok(Self { domain, url: url.to_string(), timestamp, method: LoginMethod::Detected })
    }

    /// Deduplication identity: two events with the same key denote the same login
    pub fn key(&self) -> (&str, i64) {
        (self.url.as_str(), self.timestamp)
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            bail!("Login event has an empty domain");
        }
        if self.url.is_empty() {
            bail!("Login event has an empty URL");
        }
        Ok(())
    }
}

/// Parse a URL and return its hostname
///
/// Fails for unparsable URLs and for URLs without a host (`about:blank`, `file:///...`).
pub fn hostname_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => bail!("URL has no hostname: {}", url),
    }
}

/// Ordered, deduplicated collection of login events
///
/// Order only matters for display. No two events share the same `(url, timestamp)`.
/// Deserializing goes through [`EventLog::from_events`], so a stored list with
/// duplicate keys loads deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<LoginEvent>,
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<LoginEvent>::deserialize(deserializer).map(Self::from_events)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from arbitrary events, dropping later duplicates
    pub fn from_events(events: Vec<LoginEvent>) -> Self {
        let mut log = Self::new();
        log.merge(events);
        log
    }

    /// Append `candidates` and deduplicate by `(url, timestamp)`
    ///
    /// The first occurrence in concatenation order wins, so entries already in the
    /// log are never replaced by a candidate with the same key. Returns the number
    /// of candidates offered, not the net growth of the log.
    pub fn merge(&mut self, candidates: Vec<LoginEvent>) -> usize {
        let offered = candidates.len();

        let mut combined = std::mem::take(&mut self.events);
        combined.extend(candidates);

        let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(combined.len());
        self.events = combined
            .into_iter()
            .filter(|event| seen.insert((event.url.clone(), event.timestamp)))
            .collect();

        offered
    }

    pub fn contains_key(&self, url: &str, timestamp: i64) -> bool {
        self.events.iter().any(|e| e.key() == (url, timestamp))
    }

    pub fn events(&self) -> &[LoginEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LoginEvent> {
        self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoginEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a LoginEvent;
    type IntoIter = std::slice::Iter<'a, LoginEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
