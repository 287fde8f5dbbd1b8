use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::GatewayState;
use crate::managers::Document;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /hardware/cpu - CPU description
pub async fn get(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Document> {
    let cpu = state
        .dispatch("cpu.get", credentials, |managers, ctx| async move {
            managers.cpu(ctx).get_cpu().await
        })
        .await?;

    Ok(ApiResponse::success(cpu))
}

/// GET /hardware/cpu/use - CPU utilisation
pub async fn usage(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<f64> {
    let used = state
        .dispatch("cpu.use", credentials, |managers, ctx| async move {
            managers.cpu(ctx).get_cpu_use().await
        })
        .await?;

    Ok(ApiResponse::success(used))
}

/// GET /hardware/cpu/temperature
pub async fn temperature(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<f64> {
    let celsius = state
        .dispatch("cpu.temperature", credentials, |managers, ctx| async move {
            managers.cpu(ctx).get_cpu_temperature().await
        })
        .await?;

    Ok(ApiResponse::success(celsius))
}
