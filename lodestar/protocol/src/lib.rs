//! Communication protocol for Lodestar
//!
//! This crate defines the messages exchanged between the Lodestar server
//! and its clients. It includes:
//!
//! - Stream messages pushed by the server while a research operation runs
//!   (progress updates, the final report, errors)
//! - The history listing returned by the request/response API
//!
//! Stream messages are delivered over Server-Sent Events, one JSON object
//! per event. Unknown message types must be tolerated by consumers so that
//! the server can grow the protocol without breaking older clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prelude module with commonly used types and functions
pub mod prelude;

/// A single event pushed by the server during a research operation.
///
/// The `report` and `error` variants are terminal: the server closes the
/// stream after emitting one of them and the client discards the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Progress update while the research pipeline is running
    Progress {
        /// Human-readable progress text, classified by the client
        message: String,
        /// Optional structured payload accompanying this update
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<ProgressDetails>,
    },
    /// Final report for the query, terminal on success
    Report {
        /// Report body as Markdown
        report: String,
    },
    /// Research failed, terminal
    Error {
        /// Human-readable error message
        message: String,
    },
    /// Message type this client does not know; ignored, never fatal
    #[serde(other)]
    Unknown,
}

/// Structured payload attached to some progress updates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressDetails {
    /// Source URLs being processed, in processing order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

/// One completed research operation as returned by the history endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// The query that was researched
    pub query: String,
    /// Generated report as Markdown
    pub report: String,
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
}

/// Response of the history endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Set when the history could not be retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Past research operations, newest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}
