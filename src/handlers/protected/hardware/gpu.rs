use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::GatewayState;
use crate::managers::Document;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /hardware/gpu - GPU description
pub async fn get(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Document> {
    let gpu = state
        .dispatch("gpu.get", credentials, |managers, ctx| async move {
            managers.gpu(ctx).get_gpu().await
        })
        .await?;

    Ok(ApiResponse::success(gpu))
}

/// GET /hardware/gpu/use
pub async fn usage(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<f64> {
    let used = state
        .dispatch("gpu.use", credentials, |managers, ctx| async move {
            managers.gpu(ctx).get_use().await
        })
        .await?;

    Ok(ApiResponse::success(used))
}

/// GET /hardware/gpu/temperature
pub async fn temperature(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<f64> {
    let celsius = state
        .dispatch("gpu.temperature", credentials, |managers, ctx| async move {
            managers.gpu(ctx).get_temperature().await
        })
        .await?;

    Ok(ApiResponse::success(celsius))
}
