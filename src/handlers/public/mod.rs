// handlers/public/mod.rs - Public handlers (no credentials required)

use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Host Admin API",
        "version": version,
        "description": "Host administration executed as the caller's system identity",
        "authentication": [
            "headers: username + password (base64)",
            "Authorization: Basic"
        ],
        "endpoints": {
            "user": "/user[/:user], /user/login",
            "group": "/group[/:group], /group/:group/add/:user, /group/:group/remove/:user",
            "crontab": "/crontab",
            "host": "/host",
            "storage": "/storage/disk",
            "hardware": "/hardware/cpu, /hardware/gpu, /hardware/ram",
        }
    }))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
