// Resource dispatcher: the one code path every protected operation takes.
//
//   validate shape -> authenticate -> exactly one manager call -> translate
//
// Handlers do the shape check with `require`, then hand the rest to
// `GatewayState::dispatch`. No retries.

use axum::extract::FromRef;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::auth::{ContextFactory, Credentials, ExecutionContext};
use crate::config::CredentialSchemes;
use crate::error::ApiError;
use crate::failure::DomainFailure;
use crate::managers::ManagerFactory;

/// Dependencies shared by all requests. Everything in here is immutable.
#[derive(Clone)]
pub struct GatewayState {
    pub contexts: ContextFactory,
    pub managers: Arc<dyn ManagerFactory>,
    pub schemes: CredentialSchemes,
}

impl FromRef<GatewayState> for CredentialSchemes {
    fn from_ref(state: &GatewayState) -> Self {
        state.schemes
    }
}

impl GatewayState {
    pub fn new(contexts: ContextFactory, managers: Arc<dyn ManagerFactory>) -> Self {
        Self {
            contexts,
            managers,
            schemes: CredentialSchemes::default(),
        }
    }

    pub fn with_schemes(mut self, schemes: CredentialSchemes) -> Self {
        self.schemes = schemes;
        self
    }

    /// Authenticate, then run `call` once with the managers and the fresh
    /// context. Failures from either step go through the taxonomy.
    pub async fn dispatch<T, F, Fut>(
        &self,
        operation: &'static str,
        credentials: Credentials,
        call: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(Arc<dyn ManagerFactory>, ExecutionContext) -> Fut,
        Fut: Future<Output = Result<T, DomainFailure>>,
    {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let context = self.contexts.create(credentials).await.map_err(|failure| {
            tracing::info!(%request_id, operation, kind = ?failure.kind(), "authentication rejected");
            ApiError::from(failure)
        })?;
        let identity = context.identity().to_string();

        match call(Arc::clone(&self.managers), context).await {
            Ok(value) => {
                tracing::debug!(
                    %request_id,
                    operation,
                    identity = %identity,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "operation completed"
                );
                Ok(value)
            }
            Err(failure) => {
                tracing::info!(
                    %request_id,
                    operation,
                    identity = %identity,
                    kind = ?failure.kind(),
                    "operation failed: {}",
                    failure
                );
                Err(ApiError::from(failure))
            }
        }
    }
}

/// Step 1 of the dispatcher: a required path or body field must be present
/// and non-empty.
pub fn require<T: AsRef<str>>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    match value {
        Some(v) if !v.as_ref().trim().is_empty() => Ok(v),
        _ => Err(ApiError::missing_field(field)),
    }
}

/// Same as `require` for structured body parts
pub fn require_body<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::missing_field(field))
}
