use std::fmt;
use std::sync::Arc;

use super::credentials::Credentials;
use super::verifier::{IdentityVerifier, VerifyError};
use super::{is_valid_identity, Secret};
use crate::failure::DomainFailure;
use crate::shell::{CommandOutput, CommandRunner, ShellCommand};

/// Request-scoped handle for running commands as one validated identity.
///
/// Only `ContextFactory::create` builds one, after the verifier accepted the
/// credentials. Not `Clone`: the request that created it owns it and drops
/// it when the response is produced.
pub struct ExecutionContext {
    identity: String,
    capability: Capability,
}

/// Opaque part of the context: the runner plus what it needs to act as the
/// identity.
struct Capability {
    runner: Arc<dyn CommandRunner>,
    secret: Secret,
}

impl ExecutionContext {
    fn new(identity: String, capability: Capability) -> Self {
        Self { identity, capability }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Run a command with the identity's own rights
    pub async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, DomainFailure> {
        self.capability
            .runner
            .run_as(&self.identity, &self.capability.secret, command, false)
            .await
    }

    /// Run a command through sudo as the identity. Refused by the host's
    /// sudo policy → privilege failure.
    pub async fn run_privileged(&self, command: &ShellCommand) -> Result<CommandOutput, DomainFailure> {
        self.capability
            .runner
            .run_as(&self.identity, &self.capability.secret, command, true)
            .await
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Turns raw credentials into an ExecutionContext
#[derive(Clone)]
pub struct ContextFactory {
    verifier: Arc<dyn IdentityVerifier>,
    runner: Arc<dyn CommandRunner>,
    audit: bool,
}

impl ContextFactory {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            verifier,
            runner,
            audit: false,
        }
    }

    /// Write authentication outcomes to the `audit` tracing target
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    pub async fn create(&self, credentials: Credentials) -> Result<ExecutionContext, DomainFailure> {
        let Credentials { identity, secret } = credentials;

        if identity.is_empty() || secret.is_empty() {
            return Err(DomainFailure::MissingCredentials);
        }

        if !is_valid_identity(&identity) {
            self.audit_rejection(&identity, "identity is not a valid account name");
            return Err(DomainFailure::Authentication);
        }

        match self.verifier.verify(&identity, &secret).await {
            Ok(()) => {
                if self.audit {
                    tracing::info!(target: "audit", identity = %identity, "authentication succeeded");
                }
                let capability = Capability {
                    runner: Arc::clone(&self.runner),
                    secret,
                };
                Ok(ExecutionContext::new(identity, capability))
            }
            Err(VerifyError::UnknownIdentity) => {
                self.audit_rejection(&identity, "unknown identity");
                Err(DomainFailure::Authentication)
            }
            Err(VerifyError::SecretRejected) => {
                self.audit_rejection(&identity, "secret rejected");
                Err(DomainFailure::Authentication)
            }
            Err(VerifyError::Unavailable(reason)) => {
                tracing::error!("Identity verification could not run for {}: {}", identity, reason);
                Err(DomainFailure::execution(reason))
            }
        }
    }

    fn audit_rejection(&self, identity: &str, reason: &str) {
        if self.audit {
            tracing::warn!(target: "audit", identity = %identity, reason, "authentication failed");
        } else {
            tracing::debug!("Authentication failed for {}: {}", identity, reason);
        }
    }
}
