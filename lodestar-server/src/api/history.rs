use axum::{extract::State, routing::get, Json, Router};
use lodestar_protocol::HistoryResponse;

use crate::ApiContextRef;

pub fn router() -> Router<ApiContextRef> {
    Router::new().route("/", get(get_history))
}

async fn get_history(State(context): State<ApiContextRef>) -> Json<HistoryResponse> {
    let response = match context.history.entries() {
        Ok(history) => HistoryResponse {
            error: None,
            history: Some(history),
        },
        Err(error) => HistoryResponse {
            error: Some(error.to_string()),
            history: None,
        },
    };

    Json(response)
}
