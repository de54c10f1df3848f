use serde::{Deserialize, Serialize};

/// One browsing-history record as supplied by the history capability
///
/// Only `url`, `title` and `lastVisitTime` drive classification; the remaining
/// fields are carried through for history export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_visit_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_count: Option<u32>,
}

impl HistoryRecord {
    pub fn new(url: &str, title: &str, last_visit_time: Option<i64>) -> Self {
        Self {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            last_visit_time,
            ..Self::default()
        }
    }
}

/// Parameters of a history search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Free-text filter matched against URL and title; empty matches everything
    pub text: String,
    /// Inclusive lower bound on last visit time (ms)
    pub start_time: i64,
    /// Inclusive upper bound on last visit time (ms), unbounded when `None`
    pub end_time: Option<i64>,
    pub max_results: usize,
}
