use axum::{routing::get, Router};
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::db;

pub fn routes() -> Router {
    Router::new().route("/", get(healthcheck))
}

/// Liveness probe. Always 200; the database state is reported, not fatal.
async fn healthcheck() -> ApiResult<Value> {
    let database = match db::health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check: database unreachable: {}", e);
            "unreachable"
        }
    };

    Ok(ApiResponse::success(
        json!({
            "status": "ok",
            "database": database,
            "timestamp": chrono::Utc::now(),
        }),
        "Health report OK",
    ))
}
