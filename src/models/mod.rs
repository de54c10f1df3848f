//! Data models for login detection.
//!
//! - [`LoginEvent`] - One inferred login, tagged with its [`LoginMethod`]
//! - [`EventLog`] - The persisted, deduplicated collection of login events
//! - [`HistoryRecord`] - Browsing-history input supplied by the history capability
//! - [`HistoryQuery`] - Search parameters passed to the history capability
//!
//! Wire names follow the browser conventions (`lastVisitTime`, `history_keyword`);
//! custom deserializers for timestamps live in `crate::parsers::deserializers`.

pub mod history;
pub mod login;

pub use history::{HistoryQuery, HistoryRecord};
pub use login::{EventLog, LoginEvent, LoginMethod, hostname_of};
