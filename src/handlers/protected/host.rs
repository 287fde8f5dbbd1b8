// handlers/protected/host.rs - GET /host

use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::GatewayState;
use crate::managers::Document;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /host - Host information
pub async fn get(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Document> {
    let host = state
        .dispatch("host.get", credentials, |managers, ctx| async move {
            managers.host(ctx).get_host().await
        })
        .await?;

    Ok(ApiResponse::success(host))
}
