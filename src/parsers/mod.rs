//! Parsers for login events and exported browsing history
//!
//! # Error Handling Strategy
//!
//! This module follows a **graceful degradation** approach:
//!
//! - **Individual record failures**: Malformed history records are logged and skipped,
//!   so one bad line does not prevent a keyword scan over the rest of the export.
//!
//! - **Catastrophic failure detection**: If >50% of records fail to parse, or if >100
//!   consecutive lines fail, the parser returns an error instead of a partial result.
//!
//! - **Lenient timestamps**: Browsers report visit times as fractional milliseconds;
//!   the deserializers in [`deserializers`] accept integers, doubles and RFC3339 strings.

pub mod deserializers;
pub mod history;

pub use history::parse_history_file;
