use async_trait::async_trait;
use thiserror::Error;

use super::Secret;
use crate::shell::{running_as_root, Account, CommandOutput, ShellCommand, SystemShell};

/// Why an identity check did not pass. The first two variants are only ever
/// seen by the audit log; callers get one uniform authentication failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("unknown identity")]
    UnknownIdentity,

    #[error("secret rejected")]
    SecretRejected,

    #[error("verification unavailable: {0}")]
    Unavailable(String),
}

/// OS-level identity check, the single trust boundary for raw credentials
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, identity: &str, secret: &Secret) -> Result<(), VerifyError>;
}

/// Verifies against the system password database by opening a `su` session
/// as the identity and running `true`.
///
/// A pass requires that su actually asked for the secret. su started by root
/// never asks, so a root service launches it from `launcher` instead.
#[derive(Debug, Clone)]
pub struct SuVerifier {
    shell: SystemShell,
    getent_program: String,
    launcher: String,
}

impl SuVerifier {
    pub fn new(shell: SystemShell, getent_program: impl Into<String>) -> Self {
        Self {
            shell,
            getent_program: getent_program.into(),
            launcher: "nobody".to_string(),
        }
    }

    pub fn with_launcher(mut self, account: impl Into<String>) -> Self {
        self.launcher = account.into();
        self
    }

    /// `getent passwd <name>` exits 2 when the key is not found
    async fn passwd_entry(&self, name: &str) -> Result<Option<String>, VerifyError> {
        let lookup = ShellCommand::new(&self.getent_program).args(["passwd", name]);
        let output = self
            .shell
            .run_local(&lookup)
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        match output.status {
            0 => Ok(Some(output.stdout)),
            2 => Ok(None),
            status => Err(VerifyError::Unavailable(format!(
                "{} exited with status {}: {}",
                self.getent_program,
                status,
                output.stderr.trim()
            ))),
        }
    }

    /// Account su is launched from, or None to launch it as ourselves
    async fn launch_account(&self, as_root: bool) -> Result<Option<Account>, VerifyError> {
        if !as_root {
            return Ok(None);
        }

        let entry = self.passwd_entry(&self.launcher).await?.ok_or_else(|| {
            VerifyError::Unavailable(format!("launcher account {} does not exist", self.launcher))
        })?;
        let account = parse_passwd_ids(&entry).ok_or_else(|| {
            VerifyError::Unavailable(format!("unreadable passwd entry for {}", self.launcher))
        })?;
        if account.uid == 0 {
            return Err(VerifyError::Unavailable(format!(
                "launcher account {} has uid 0",
                self.launcher
            )));
        }
        Ok(Some(account))
    }

    async fn check(&self, identity: &str, secret: &Secret, as_root: bool) -> Result<(), VerifyError> {
        if self.passwd_entry(identity).await?.is_none() {
            return Err(VerifyError::UnknownIdentity);
        }

        let launcher = self.launch_account(as_root).await?;
        let transcript = self
            .shell
            .session(identity, secret, &ShellCommand::new("true"), false, launcher)
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        if !transcript.su_prompted {
            return Err(VerifyError::Unavailable(
                "su opened a session without asking for the secret".to_string(),
            ));
        }
        if transcript.started && transcript.output.success() {
            return Ok(());
        }
        Err(su_refusal(&transcript.output))
    }
}

#[async_trait]
impl IdentityVerifier for SuVerifier {
    async fn verify(&self, identity: &str, secret: &Secret) -> Result<(), VerifyError> {
        self.check(identity, secret, running_as_root()).await
    }
}

/// uid and gid from a `name:x:uid:gid:...` passwd line
fn parse_passwd_ids(entry: &str) -> Option<Account> {
    let mut fields = entry.lines().next()?.split(':').skip(2);
    let uid = fields.next()?.parse().ok()?;
    let gid = fields.next()?.parse().ok()?;
    Some(Account { uid, gid })
}

/// Read a failed `su` run
fn su_refusal(output: &CommandOutput) -> VerifyError {
    let stderr = output.stderr.to_lowercase();
    if stderr.contains("authentication failure") || stderr.contains("incorrect password") {
        VerifyError::SecretRejected
    } else if stderr.contains("does not exist") || stderr.contains("unknown") {
        VerifyError::UnknownIdentity
    } else {
        VerifyError::Unavailable(format!(
            "su exited with status {}: {}",
            output.status,
            output.stderr.trim()
        ))
    }
}
