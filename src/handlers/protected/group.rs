// handlers/protected/group.rs - /group resource

use axum::extract::{Path, State};

use crate::auth::Credentials;
use crate::dispatch::{require, GatewayState};
use crate::managers::Group;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};

/// GET /group - List system groups
pub async fn list(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Vec<Group>> {
    let groups = state
        .dispatch("group.list", credentials, |managers, ctx| async move {
            managers.groups(ctx).get_groups().await
        })
        .await?;

    Ok(ApiResponse::success(groups))
}

/// GET /group/:group - Get one group
pub async fn get(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(group): Path<String>,
) -> ApiResult<Group> {
    let name = require(Some(group), "group")?;

    let found = state
        .dispatch("group.get", credentials, move |managers, ctx| async move {
            managers.groups(ctx).get_group(&name).await
        })
        .await?;

    Ok(ApiResponse::success(found))
}

/// POST /group - Create a group (201)
pub async fn create(
    State(state): State<GatewayState>,
    credentials: Credentials,
    ValidJson(group): ValidJson<Group>,
) -> ApiResult<Group> {
    require(group.name.as_deref(), "group")?;

    let created = state
        .dispatch("group.create", credentials, move |managers, ctx| async move {
            managers.groups(ctx).add_group(group).await
        })
        .await?;

    Ok(ApiResponse::created(created))
}

/// PUT /group/:group - Edit (or rename) a group
pub async fn update(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(group_name): Path<String>,
    ValidJson(group): ValidJson<Group>,
) -> ApiResult<Group> {
    let name = require(Some(group_name), "group")?;
    require(group.name.as_deref(), "group")?;

    let updated = state
        .dispatch("group.update", credentials, move |managers, ctx| async move {
            managers.groups(ctx).edit_group(&name, group).await
        })
        .await?;

    Ok(ApiResponse::success(updated))
}

/// POST /group/:group/add/:user - Add a member; returns the updated group
pub async fn add_member(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path((group_name, user)): Path<(String, String)>,
) -> ApiResult<Group> {
    let group_name = require(Some(group_name), "group")?;
    let user = require(Some(user), "user")?;

    let updated = state
        .dispatch("group.add_member", credentials, move |managers, ctx| async move {
            managers.groups(ctx).add_user_to_group(&group_name, &user).await
        })
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /group/:group/remove/:user - Remove a member; returns the updated group
pub async fn remove_member(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path((group_name, user)): Path<(String, String)>,
) -> ApiResult<Group> {
    let group_name = require(Some(group_name), "group")?;
    let user = require(Some(user), "user")?;

    let updated = state
        .dispatch("group.remove_member", credentials, move |managers, ctx| async move {
            managers.groups(ctx).remove_user_from_group(&group_name, &user).await
        })
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /group/:group - Delete a group (204)
pub async fn delete(
    State(state): State<GatewayState>,
    credentials: Credentials,
    Path(group_name): Path<String>,
) -> ApiResult<()> {
    let name = require(Some(group_name), "group")?;

    state
        .dispatch("group.delete", credentials, move |managers, ctx| async move {
            managers.groups(ctx).delete_group(&name).await
        })
        .await?;

    Ok(ApiResponse::no_content())
}
