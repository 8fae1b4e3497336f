use crate::stage::{Stage, StageStatus};

/// Rendering instruction emitted by the interpreter.
///
/// Commands are ordered; a consumer must apply them in the order they are
/// returned. `AppendSubStatus` commands may be displayed with a delay between
/// items as long as their relative order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// Clear the progress display for a new session
    Reset,
    /// Update one stage's status and status text
    SetStage {
        stage: Stage,
        status: StageStatus,
        message: String,
    },
    /// Append a per-item sub-status line under a stage
    AppendSubStatus { stage: Stage, text: String },
    /// Render the final report, terminal on success
    RenderReport { html: String },
    /// Render a terminal error
    RenderError { message: String },
}

/// Rendering surface driven by the interpreter.
///
/// Implementations only receive calls; timing, layout and styling are their
/// own concern. The terminal frontend in `lodestar-cli` is the reference
/// implementation.
pub trait ProgressView: Send + Sync {
    /// Clear any previous session's output
    fn reset(&self);

    /// Update a stage's status and status text
    fn set_stage(&self, stage: Stage, status: StageStatus, message: &str);

    /// Append a per-item sub-status line under a stage
    fn append_sub_status(&self, stage: Stage, text: &str);

    /// Show the final report
    fn render_report(&self, html: &str);

    /// Show a terminal error
    fn render_error(&self, message: &str);
}

/// Forward a batch of interpreter commands to a view, in order.
///
/// Sub-status pacing is the caller's concern; this helper applies every
/// command immediately.
pub fn dispatch(view: &dyn ProgressView, commands: &[ViewCommand]) {
    for command in commands {
        match command {
            ViewCommand::Reset => view.reset(),
            ViewCommand::SetStage {
                stage,
                status,
                message,
            } => view.set_stage(*stage, *status, message),
            ViewCommand::AppendSubStatus { stage, text } => view.append_sub_status(*stage, text),
            ViewCommand::RenderReport { html } => view.render_report(html),
            ViewCommand::RenderError { message } => view.render_error(message),
        }
    }
}
