// handlers/protected/user.rs - /user resource

use axum::extract::{Path, State};

use crate::auth::Credentials;
use crate::dispatch::{require, GatewayState};
use crate::managers::User;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};

/// GET /user/login - Check the credentials and greet the caller
pub async fn login(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<String> {
    let greeting = state
        .dispatch("user.login", credentials, |_, ctx| async move {
            Ok(format!("Welcome {}!", ctx.identity()))
        })
        .await?;

    Ok(ApiResponse::success(greeting))
}

/// GET /user - List system users
pub async fn list(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Vec<User>> {
    let users = state
        .dispatch("user.list", credentials, |managers, ctx| async move {
            managers.users(ctx).get_users().await
        })
        .await?;

    Ok(ApiResponse::success(users))
}

/// GET /user/:user - Get one user
pub async fn get(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(user): Path<String>,
) -> ApiResult<User> {
    let name = require(Some(user), "user")?;

    let found = state
        .dispatch("user.get", credentials, move |managers, ctx| async move {
            managers.users(ctx).get_user(&name).await
        })
        .await?;

    Ok(ApiResponse::success(found))
}

/// POST /user - Create a user; returns it as stored (201)
pub async fn create(
    State(state): State<GatewayState>,
    credentials: Credentials,
    ValidJson(user): ValidJson<User>,
) -> ApiResult<User> {
    require(user.name.as_deref(), "user")?;

    let created = state
        .dispatch("user.create", credentials, move |managers, ctx| async move {
            managers.users(ctx).add_user(user).await
        })
        .await?;

    Ok(ApiResponse::created(created))
}

/// PUT /user/:user - Apply changes to a user
pub async fn update(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(user): Path<String>,
    ValidJson(changes): ValidJson<User>,
) -> ApiResult<User> {
    let name = require(Some(user), "username")?;

    let updated = state
        .dispatch("user.update", credentials, move |managers, ctx| async move {
            managers.users(ctx).edit_user(&name, changes).await
        })
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /user/:user - Delete a user (204)
pub async fn delete(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(user): Path<String>,
) -> ApiResult<()> {
    let name = require(Some(user), "username")?;

    state
        .dispatch("user.delete", credentials, move |managers, ctx| async move {
            managers.users(ctx).delete_user(&name).await
        })
        .await?;

    Ok(ApiResponse::no_content())
}
