// handlers/protected/crontab.rs - /crontab resource (the caller's own crontab)

use axum::extract::State;

use crate::auth::Credentials;
use crate::dispatch::{require_body, GatewayState};
use crate::managers::{CronJob, CronJobChange};
use crate::middleware::{ApiResponse, ApiResult, ValidJson};

/// GET /crontab - Jobs in the caller's crontab
pub async fn list(State(state): State<GatewayState>, credentials: Credentials) -> ApiResult<Vec<CronJob>> {
    let jobs = state
        .dispatch("crontab.list", credentials, |managers, ctx| async move {
            managers.crontab(ctx).get_cron_jobs().await
        })
        .await?;

    Ok(ApiResponse::success(jobs))
}

/// POST /crontab - Append a job (201)
pub async fn create(
    State(state): State<GatewayState>,
    credentials: Credentials,
    ValidJson(job): ValidJson<CronJob>,
) -> ApiResult<CronJob> {
    let created = state
        .dispatch("crontab.create", credentials, move |managers, ctx| async move {
            managers.crontab(ctx).add_cron_job(job).await
        })
        .await?;

    Ok(ApiResponse::created(created))
}

/// PUT /crontab - Replace `old_cron_job` with `new_cron_job`
pub async fn update(
    State(state): State<GatewayState>,
    credentials: Credentials,
    ValidJson(change): ValidJson<CronJobChange>,
) -> ApiResult<CronJob> {
    let old = require_body(change.old_cron_job, "old_cron_job")?;
    let new = require_body(change.new_cron_job, "new_cron_job")?;

    let updated = state
        .dispatch("crontab.update", credentials, move |managers, ctx| async move {
            managers.crontab(ctx).edit_cron_job(old, new).await
        })
        .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /crontab - Remove a job (204)
pub async fn delete(
    State(state): State<GatewayState>,
    credentials: Credentials,
    ValidJson(job): ValidJson<CronJob>,
) -> ApiResult<()> {
    state
        .dispatch("crontab.delete", credentials, move |managers, ctx| async move {
            managers.crontab(ctx).delete_cron_job(job).await
        })
        .await?;

    Ok(ApiResponse::no_content())
}
