//! # Lodestar Core
//!
//! Client-side core of the Lodestar research assistant. This crate owns the
//! two pieces with actual state-transition logic:
//!
//! - [`stream::EventStreamClient`]: opens the server-push connection for one
//!   query, decodes each inbound payload and guarantees that at most one
//!   session is live at a time (superseded sessions are cancelled by epoch).
//! - [`interpreter::ProgressInterpreter`]: pure state machine that consumes
//!   decoded [`lodestar_protocol::StreamMessage`]s and emits
//!   [`view::ViewCommand`]s driving a 4-stage progress display plus the
//!   final report rendering.
//!
//! Rendering itself is behind the [`view::ProgressView`] trait so that
//! frontends (the terminal CLI, tests) can plug in their own surface.

pub mod error;
pub mod interpreter;
pub mod render;
pub mod stage;
pub mod stream;
pub mod view;

/// Prelude to import all relevant models and functions
pub mod prelude {
    pub use super::interpreter::{Phase, ProgressInterpreter};
    pub use super::render::markdown_to_html;
    pub use super::stage::{Stage, StageState, StageStatus};
    pub use super::stream::{EventStreamClient, StreamHandle};
    pub use super::view::{dispatch, ProgressView, ViewCommand};

    pub use lodestar_protocol::prelude::*;
}

pub type Result<T> = core::result::Result<T, error::Error>;
