use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use lodestar_core::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::view::TerminalView;

/// Delay between staggered per-item sub-status lines
const SUB_STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Run one research query end to end: open the stream, interpret every
/// message and drive the terminal view until a terminal message arrives.
pub async fn run_research(
    server: &str,
    query: &str,
    output: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    let client = EventStreamClient::try_new(server).context("Invalid server URL")?;
    let view = Arc::new(TerminalView::new(output));
    let mut interpreter = ProgressInterpreter::new();

    dispatch(view.as_ref(), &interpreter.begin());

    info!("Submitting research query: {}", query);
    let mut handle = client
        .start(query)
        .await
        .context("Failed to open research stream")?;
    let session_token = handle.cancellation_token();

    while let Some(message) = handle.recv().await {
        let commands = interpreter.apply(&message);

        // Sub-status items are displayed with a fixed delay between them;
        // everything else is applied immediately. Cancelling the session
        // also cancels any still-pending sub-status lines.
        let mut staggered = Vec::new();
        for command in commands {
            match command {
                ViewCommand::AppendSubStatus { stage, text } => staggered.push((stage, text)),
                other => dispatch(view.as_ref(), &[other]),
            }
        }
        if !staggered.is_empty() {
            tokio::spawn(stagger_sub_statuses(
                Arc::clone(&view),
                staggered,
                session_token.clone(),
            ));
        }

        if interpreter.is_terminal() {
            handle.close();
            break;
        }
    }

    match interpreter.phase() {
        Phase::Done => {
            info!("Research complete");
            Ok(())
        }
        Phase::Failed => Err(anyhow!("research failed, see error above")),
        phase => {
            debug!(?phase, "stream ended without a terminal message");
            Err(anyhow!("stream ended unexpectedly"))
        }
    }
}

/// Display sub-status lines one by one, preserving item order, until the
/// session is cancelled.
async fn stagger_sub_statuses(
    view: Arc<TerminalView>,
    items: Vec<(Stage, String)>,
    token: CancellationToken,
) {
    for (position, (stage, text)) in items.into_iter().enumerate() {
        if position > 0 {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(SUB_STATUS_INTERVAL) => {}
            }
        }
        if token.is_cancelled() {
            return;
        }
        view.append_sub_status(stage, &text);
    }
}
