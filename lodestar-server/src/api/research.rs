use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use lodestar_protocol::StreamMessage;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};
use uuid::Uuid;

use crate::progress::ProgressSender;
use crate::ApiContextRef;

pub fn router() -> Router<ApiContextRef> {
    Router::new().route("/stream", get(stream_research))
}

#[derive(Debug, Deserialize)]
struct ResearchParams {
    #[serde(default)]
    query: String,
}

/// Open a research stream for one query.
///
/// The response is an SSE stream of [`StreamMessage`]s; it ends after the
/// terminal `report` or `error` message. Successful reports are recorded
/// in the history before the terminal message is sent.
async fn stream_research(
    State(context): State<ApiContextRef>,
    Query(params): Query<ResearchParams>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (tx, rx) = mpsc::channel::<StreamMessage>(32);
    let session_id = Uuid::new_v4();
    let query = params.query.trim().to_string();

    tokio::spawn(async move {
        if query.is_empty() {
            let _ = tx
                .send(StreamMessage::Error {
                    message: "Missing query".to_string(),
                })
                .await;
            return;
        }

        info!(%session_id, query = %query, "research session started");
        let progress = ProgressSender::new(tx.clone());

        match context.agent.run(&query, &progress).await {
            Ok(report) => {
                context.history.record(&query, &report);
                info!(%session_id, "research session succeeded");
                let _ = tx.send(StreamMessage::Report { report }).await;
            }
            Err(agent_error) => {
                error!(%session_id, %agent_error, "research session failed");
                let _ = tx
                    .send(StreamMessage::Error {
                        message: agent_error.to_string(),
                    })
                    .await;
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(|message| Event::default().json_data(&message));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
