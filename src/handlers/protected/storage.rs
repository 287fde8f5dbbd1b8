// handlers/protected/storage.rs - /storage resources

use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::GatewayState;
use crate::managers::Document;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /storage/disk - Block devices
pub async fn disks(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Vec<Document>> {
    let disks = state
        .dispatch("storage.disks", credentials, |managers, ctx| async move {
            managers.disks(ctx).get_disks().await
        })
        .await?;

    Ok(ApiResponse::success(disks))
}
