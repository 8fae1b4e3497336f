use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::ApiContextRef;

pub fn router() -> Router<ApiContextRef> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    version: String,
}

impl HealthCheckResponse {
    fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

async fn health_check() -> Json<HealthCheckResponse> {
    HealthCheckResponse::ok().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_reports_status_and_version() {
        let json = serde_json::to_value(HealthCheckResponse::ok()).unwrap();

        assert_eq!(json["status"], "OK");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
