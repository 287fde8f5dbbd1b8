use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::GatewayState;
use crate::managers::{Document, RamUsage};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /hardware/ram - Installed memory modules. Reading DMI tables needs
/// privileges, so non-admin callers usually get 403.
pub async fn get(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Vec<Document>> {
    let modules = state
        .dispatch("ram.get", credentials, |managers, ctx| async move {
            managers.ram(ctx).get_ram().await
        })
        .await?;

    Ok(ApiResponse::success(modules))
}

/// GET /hardware/ram/use - `{size, use}` in bytes
pub async fn usage(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<RamUsage> {
    let usage = state
        .dispatch("ram.use", credentials, |managers, ctx| async move {
            managers.ram(ctx).get_use().await
        })
        .await?;

    Ok(ApiResponse::success(usage))
}
