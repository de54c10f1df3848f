//! Messages between pages, the presentation layer and the coordinator
//!
//! Wire format (JSON), one object per message:
//!
//! ```text
//! {"type":"report_login","payload":{"domain":..,"url":..,"timestamp":..,"method":"detected"}}
//! {"type":"get_logins"}
//! {"type":"export_history","payload":{"text":"","maxResults":10000,"startTimeDays":365}}
//! {"type":"scan_history_keywords","payload":{"days":30}}
//! ```
//!
//! Two delivery modes exist. [`AggregatorHandle::notify`] is one-way: nothing
//! waits for the outcome (page reports). [`AggregatorHandle::request`] waits
//! for the reply with no timeout; if the handler fails it drops the reply
//! channel and the caller gets an error instead of an acknowledgment.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::detector::ReportSink;
use crate::models::{HistoryRecord, LoginEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHistoryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_truncated",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParams {
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_truncated",
        skip_serializing_if = "Option::is_none"
    )]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Request {
    ReportLogin(LoginEvent),
    GetLogins,
    ExportHistory(Option<ExportHistoryParams>),
    ScanHistoryKeywords(Option<ScanParams>),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::ReportLogin(_) => "report_login",
            Request::GetLogins => "get_logins",
            Request::ExportHistory(_) => "export_history",
            Request::ScanHistoryKeywords(_) => "scan_history_keywords",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// `scan_history_keywords`; `added` is the candidate batch size
    Scanned { ok: bool, added: usize },
    /// `report_login`
    Ack { ok: bool },
    /// `get_logins`
    Logins { events: Vec<LoginEvent> },
    /// `export_history`
    History { history: Vec<HistoryRecord> },
}

/// A request in flight, with its reply channel when the sender waits
#[derive(Debug)]
pub struct Envelope {
    pub request: Request,
    pub reply: Option<oneshot::Sender<Response>>,
}

/// Cloneable sending side of the coordinator's inbox
#[derive(Debug, Clone)]
pub struct AggregatorHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl AggregatorHandle {
    /// Create a handle and the inbox the coordinator serves
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Send without waiting for any reply
    pub fn notify(&self, request: Request) -> Result<()> {
        self.tx
            .send(Envelope { request, reply: None })
            .map_err(|_| anyhow!("Aggregator is not running"))
    }

    /// Send and wait for the reply
    pub async fn request(&self, request: Request) -> Result<Response> {
        let kind = request.kind();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply: Some(reply_tx) })
            .map_err(|_| anyhow!("Aggregator is not running"))?;

        reply_rx
            .await
            .with_context(|| format!("Aggregator dropped the {} request without replying", kind))
    }
}

impl ReportSink for AggregatorHandle {
    fn report(&self, event: LoginEvent) -> Result<()> {
        self.notify(Request::ReportLogin(event))
    }
}
