//! Prelude module that exports commonly used types and functions.
//!
//! This module provides a convenient way to import all the necessary
//! components with a single `use lodestar_protocol::prelude::*;` statement.

// Message types
pub use crate::{HistoryEntry, HistoryResponse, ProgressDetails, StreamMessage};
