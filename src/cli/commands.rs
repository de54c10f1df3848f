use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::{JoinHandle, JoinSet};

use crate::aggregator::Aggregator;
use crate::history::{FileHistory, HistoryProvider, StaticHistory};
use crate::messaging::{AggregatorHandle, ExportHistoryParams, Request, Response, ScanParams};
use crate::models::{HistoryRecord, LoginEvent};
use crate::store::FileEventStore;
use crate::summary::{DEFAULT_TOP_DOMAINS, Summary};
use crate::utils::{format_path_with_tilde, format_timestamp, get_data_dir, now_millis, sanitize_line};

#[derive(Parser)]
#[command(name = "login-history")]
#[command(version = "0.1.0")]
#[command(about = "Detect, deduplicate and inspect website login events", long_about = None)]
pub struct Cli {
    /// Directory holding the login log (default: $LOGIN_HISTORY_DIR or the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List recorded login events
    List {
        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a detected login for a page URL
    Report {
        url: String,
        /// Event time in milliseconds since the epoch (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Scan exported browsing history for login-related pages
    Scan {
        /// Exported history file (JSON array or JSON Lines)
        #[arg(long)]
        history: PathBuf,
        /// Lookback window in days (default: 365)
        #[arg(long)]
        days: Option<i64>,
    },
    /// Print history records from an exported history file as JSON
    ExportHistory {
        #[arg(long)]
        history: PathBuf,
        /// Free-text filter on URL and title
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        max_results: Option<usize>,
        /// Lookback window in days (default: 365)
        #[arg(long)]
        days: Option<i64>,
    },
    /// Show statistics about recorded logins
    Stats {
        /// Number of domains to list
        #[arg(long, default_value_t = DEFAULT_TOP_DOMAINS)]
        top: usize,
    },
    /// Answer JSON requests from stdin, one per line
    Serve {
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use --help for usage information");
        return Ok(());
    };

    let data_dir = get_data_dir(cli.data_dir)?;

    match command {
        Commands::List { json } => list(&data_dir, json).await,
        Commands::Report { url, timestamp } => report(&data_dir, &url, timestamp).await,
        Commands::Scan { history, days } => scan(&data_dir, &history, days).await,
        Commands::ExportHistory { history, text, max_results, days } => {
            let params = ExportHistoryParams { text, max_results, start_time_days: days };
            export_history(&data_dir, &history, params).await
        }
        Commands::Stats { top } => show_stats(&data_dir, top).await,
        Commands::Serve { history } => serve(&data_dir, history.as_deref()).await,
    }
}

/// A running coordinator for the duration of one command
struct Session {
    handle: AggregatorHandle,
    server: JoinHandle<()>,
}

impl Session {
    fn start(data_dir: &Path, history: Option<&Path>) -> Self {
        let store = Arc::new(FileEventStore::in_dir(data_dir));
        let history: Arc<dyn HistoryProvider> = match history {
            Some(path) => Arc::new(FileHistory::new(path)),
            None => Arc::new(StaticHistory::default()),
        };

        let aggregator = Arc::new(Aggregator::new(store, history));
        let (handle, inbox) = AggregatorHandle::channel();
        let server = tokio::spawn(aggregator.serve(inbox));

        Self { handle, server }
    }

    async fn finish(self) -> Result<()> {
        drop(self.handle);
        self.server.await.context("Aggregator task failed")
    }
}

async fn fetch_events(session: &Session) -> Result<Vec<LoginEvent>> {
    match session.handle.request(Request::GetLogins).await? {
        Response::Logins { events } => Ok(events),
        other => bail!("Unexpected reply to get_logins: {:?}", other),
    }
}

async fn list(data_dir: &Path, json: bool) -> Result<()> {
    let session = Session::start(data_dir, None);
    let events = fetch_events(&session).await?;
    session.finish().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No login events recorded");
        return Ok(());
    }

    for event in &events {
        println!(
            "{:<14} {:<16} {:<30} {}",
            format_timestamp(event.timestamp),
            event.method.as_str(),
            sanitize_line(&event.domain),
            sanitize_line(&event.url)
        );
    }

    Ok(())
}

async fn report(data_dir: &Path, url: &str, timestamp: Option<i64>) -> Result<()> {
    let event = LoginEvent::detected(url, timestamp.unwrap_or_else(now_millis))?;
    let domain = event.domain.clone();

    let session = Session::start(data_dir, None);
    let reply = session.handle.request(Request::ReportLogin(event)).await;
    session.finish().await?;

    match reply? {
        Response::Ack { ok: true } => {
            println!("Recorded login for {}", sanitize_line(&domain));
            Ok(())
        }
        other => bail!("Unexpected reply to report_login: {:?}", other),
    }
}

async fn scan(data_dir: &Path, history: &Path, days: Option<i64>) -> Result<()> {
    let session = Session::start(data_dir, Some(history));
    let reply =
        session.handle.request(Request::ScanHistoryKeywords(Some(ScanParams { days }))).await;
    session.finish().await?;

    match reply? {
        Response::Scanned { added, .. } => {
            println!("Scanned history: {} login event(s) added", added);
            Ok(())
        }
        other => bail!("Unexpected reply to scan_history_keywords: {:?}", other),
    }
}

async fn export_history(data_dir: &Path, history: &Path, params: ExportHistoryParams) -> Result<()> {
    let session = Session::start(data_dir, Some(history));
    let reply = session.handle.request(Request::ExportHistory(Some(params))).await;
    session.finish().await?;

    let records: Vec<HistoryRecord> = match reply? {
        Response::History { history } => history,
        other => bail!("Unexpected reply to export_history: {:?}", other),
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn show_stats(data_dir: &Path, top: usize) -> Result<()> {
    let session = Session::start(data_dir, None);
    let events = fetch_events(&session).await?;
    session.finish().await?;

    let summary = Summary::from_events(&events, top);

    println!("Login History Statistics");
    println!("========================");
    println!("Total events: {}", summary.total);
    println!("  Detected: {}", summary.detected);
    println!("  History keyword: {}", summary.history_keyword);
    println!();
    println!("Data directory: {}", format_path_with_tilde(data_dir));

    if let Some(oldest) = summary.oldest {
        println!("Oldest event: {}", format_absolute(oldest));
    }
    if let Some(newest) = summary.newest {
        println!("Newest event: {}", format_absolute(newest));
    }

    if !summary.top_domains.is_empty() {
        println!();
        println!("Top domains:");
        for entry in &summary.top_domains {
            println!("  {:>6}  {}", entry.count, sanitize_line(&entry.domain));
        }
    }

    if !summary.per_day.is_empty() {
        println!();
        println!("Logins per day:");
        for day in &summary.per_day {
            println!("  {}  {}", day.date, day.count);
        }
    }

    Ok(())
}

fn format_absolute(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}

/// Line-oriented bridge for a host runtime
///
/// Each stdin line is one request and gets exactly one stdout line. Requests
/// run concurrently, so replies come back in completion order; a request
/// carrying an `"id"` member gets the same `"id"` on its reply so the host can
/// pair them up. Unparsable lines and failed handlers answer
/// `{"ok":false,"error":...}` instead of a normal reply.
async fn serve(data_dir: &Path, history: Option<&Path>) -> Result<()> {
    let session = Session::start(data_dir, history);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut pending = JoinSet::new();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.context("Failed to read request")? {
                    Some(line) if !line.trim().is_empty() => {
                        pending.spawn(answer(session.handle.clone(), line));
                    }
                    Some(_) => {}
                    None => input_open = false,
                }
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                let mut out = joined.context("Request task failed")??;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await.context("Failed to write reply")?;
                stdout.flush().await.context("Failed to write reply")?;
            }
            else => break,
        }
    }

    session.finish().await
}

/// Answer one request line with one reply line (without the newline)
async fn answer(handle: AggregatorHandle, line: String) -> Result<String> {
    let mut id = None;

    let mut reply = match serde_json::from_str::<Value>(&line) {
        Ok(mut value) => {
            id = value.as_object_mut().and_then(|object| object.remove("id"));
            match serde_json::from_value::<Request>(value) {
                Ok(request) => match handle.request(request).await {
                    Ok(response) => serde_json::to_value(&response)?,
                    Err(e) => json!({ "ok": false, "error": format!("{:#}", e) }),
                },
                Err(e) => rejected(e),
            }
        }
        Err(e) => rejected(e),
    };

    if let Some(id) = id
        && let Some(object) = reply.as_object_mut()
    {
        object.insert("id".to_string(), id);
    }

    Ok(serde_json::to_string(&reply)?)
}

fn rejected(e: serde_json::Error) -> Value {
    log::warn!("Rejected malformed request: {}", e);
    json!({ "ok": false, "error": format!("Invalid request: {}", e) })
}
