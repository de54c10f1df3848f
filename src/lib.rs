//! Login History - infer website logins and keep a deduplicated log of them
//!
//! Logins are inferred from two client-side signals:
//!
//! - Live: a [`PageDetector`] inside each page reports submissions of forms
//!   that contain a password input
//! - Retrospective: the [`HistoryScanner`] classifies browsing-history records
//!   whose URL or title carries authentication vocabulary
//!
//! Both feed the [`Aggregator`], the only writer of the [`EventLog`]. It merges
//! candidates append-then-dedup on the `(url, timestamp)` key and answers
//! queries. Storage, history search, DOM access and messaging are injected
//! capabilities ([`EventStore`], [`HistoryProvider`], [`Document`],
//! [`AggregatorHandle`]).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use login_history::{Aggregator, AggregatorHandle, MemoryEventStore, Request, StaticHistory};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let aggregator =
//!     Arc::new(Aggregator::new(Arc::new(MemoryEventStore::new()), Arc::new(StaticHistory::default())));
//! let (handle, inbox) = AggregatorHandle::channel();
//! let server = tokio::spawn(aggregator.serve(inbox));
//!
//! let reply = handle.request(Request::GetLogins).await?;
//! println!("{:?}", reply);
//!
//! drop(handle);
//! server.await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cli;
pub mod detector;
pub mod history;
pub mod messaging;
pub mod models;
pub mod parsers;
pub mod scanner;
pub mod store;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use detector::{Document, InMemoryDocument, Page, PageDetector, ReportSink};
pub use history::{FileHistory, HistoryProvider, StaticHistory};
pub use messaging::{AggregatorHandle, Request, Response};
pub use models::{EventLog, HistoryRecord, LoginEvent, LoginMethod};
pub use scanner::HistoryScanner;
pub use store::{EventStore, FileEventStore, MemoryEventStore};
