//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Database reachability.
    pub database: &'static str,
}

fn health_body(database_ok: bool) -> HealthResponse {
    HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" },
        service: "kasira",
        version: env!("CARGO_PKG_VERSION"),
        database: if database_ok { "up" } else { "down" },
    }
}

/// Health check handler. Pings the connection pool so a lost database
/// shows up here before purchase order requests start failing.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state.db.ping().await.is_ok();
    Json(health_body(database_ok))
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_when_database_answers() {
        let body = health_body(true);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "kasira");
        assert_eq!(body.database, "up");
    }

    #[test]
    fn test_degraded_when_database_down() {
        let body = health_body(false);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.database, "down");
    }
}
