// Command execution as a system identity.
//
// SystemShell runs every command through `su <identity> -c`, so the command
// gets exactly that identity's rights. Privileged commands add `sudo -S`
// inside the su session, which makes sudo apply the identity's own sudoers
// policy. The secret is handed over in a prompt-driven session, see
// `session`.

mod session;

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::auth::Secret;
use crate::config::ShellConfig;
use crate::failure::DomainFailure;

use session::Markers;
pub(crate) use session::Transcript;

/// One command to run on behalf of a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Render as a single `sh -c` string with every word quoted
    pub fn to_shell_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| quote(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command. A non-zero status is not an error here;
/// domain managers decide what it means.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Host command-execution subsystem
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_as(
        &self,
        identity: &str,
        secret: &Secret,
        command: &ShellCommand,
        privileged: bool,
    ) -> Result<CommandOutput, DomainFailure>;
}

/// Single-quote a word for `sh`
pub fn quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ','))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

const SUDO_REFUSALS: &[&str] = &[
    "is not in the sudoers file",
    "is not allowed to execute",
    "is not allowed to run sudo",
    "a password is required",
    "incorrect password attempt",
];

/// Map sudo's refusal messages onto a privilege failure
pub fn privilege_refusal(stderr: &str) -> Option<DomainFailure> {
    let lowered = stderr.to_lowercase();
    SUDO_REFUSALS
        .iter()
        .any(|needle| lowered.contains(needle))
        .then(|| DomainFailure::privileges(stderr.trim()))
}

/// Numeric owner a process is started under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub uid: u32,
    pub gid: u32,
}

/// The service's effective uid is 0
#[cfg(unix)]
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

#[cfg(unix)]
fn launch_as(command: &mut Command, account: Account) {
    command.uid(account.uid).gid(account.gid);
}

#[cfg(not(unix))]
fn launch_as(_command: &mut Command, _account: Account) {}

/// CommandRunner backed by tokio::process and su/sudo
#[derive(Debug, Clone)]
pub struct SystemShell {
    su_program: String,
    sudo_program: String,
    timeout: Duration,
}

impl SystemShell {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            su_program: config.su_program.clone(),
            sudo_program: config.sudo_program.clone(),
            timeout: config.command_timeout(),
        }
    }

    /// Build the `su` invocation. The target shell prints the ready marker
    /// on stderr and then execs the command, with sudo in between when
    /// privileged.
    fn su_invocation(
        &self,
        identity: &str,
        command: &ShellCommand,
        privileged: bool,
        markers: &Markers,
    ) -> ShellCommand {
        let inner = format!(
            "printf '%s\\n' {} >&2; exec {}",
            quote(&markers.ready),
            command.to_shell_line()
        );
        let line = if privileged {
            format!(
                "exec {} -S -k -p {} -- sh -c {}",
                quote(&self.sudo_program),
                quote(&markers.sudo_prompt),
                quote(&inner)
            )
        } else {
            inner
        };

        ShellCommand::new(&self.su_program).args([identity, "-c", line.as_str()])
    }

    fn command(&self, spec: &ShellCommand, launcher: Option<Account>) -> Command {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(account) = launcher {
            launch_as(&mut command, account);
        }
        command
    }

    /// Run `command` as `identity` and report how the su/sudo conversation
    /// went. `launcher` starts su under another account.
    pub(crate) async fn session(
        &self,
        identity: &str,
        secret: &Secret,
        command: &ShellCommand,
        privileged: bool,
        launcher: Option<Account>,
    ) -> Result<Transcript, DomainFailure> {
        let markers = Markers::new();
        let su = self.su_invocation(identity, command, privileged, &markers);
        tracing::debug!(identity, program = %command.program, privileged, "running command");

        let child = self
            .command(&su, launcher)
            .spawn()
            .map_err(|e| DomainFailure::execution(format!("failed to start {}: {}", su.program, e)))?;

        tokio::time::timeout(
            self.timeout,
            session::drive(child, secret, &markers, command.stdin.clone()),
        )
        .await
        .map_err(|_| DomainFailure::execution(format!("{} timed out after {:?}", command.program, self.timeout)))?
    }

    /// Run a program as the service's own user, without su
    pub async fn run_local(&self, command: &ShellCommand) -> Result<CommandOutput, DomainFailure> {
        let mut child = self
            .command(command, None)
            .spawn()
            .map_err(|e| DomainFailure::execution(format!("failed to start {}: {}", command.program, e)))?;

        let stdin = child.stdin.take();
        let input = command.stdin.clone().unwrap_or_default();
        let program = command.program.clone();

        let run = async move {
            let write = async move {
                if let Some(mut pipe) = stdin {
                    // A command that exits without reading stdin closes the pipe early
                    if let Err(e) = pipe.write_all(input.as_bytes()).await {
                        tracing::debug!("stdin for {} closed early: {}", program, e);
                    }
                }
            };
            let (_, output) = tokio::join!(write, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                DomainFailure::execution(format!("{} timed out after {:?}", command.program, self.timeout))
            })??;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl CommandRunner for SystemShell {
    async fn run_as(
        &self,
        identity: &str,
        secret: &Secret,
        command: &ShellCommand,
        privileged: bool,
    ) -> Result<CommandOutput, DomainFailure> {
        let transcript = self.session(identity, secret, command, privileged, None).await?;
        let output = transcript.output;

        if privileged && !output.success() {
            if let Some(refusal) = privilege_refusal(&output.stderr) {
                return Err(refusal);
            }
        }
        if !transcript.started {
            return Err(DomainFailure::execution(format!(
                "{} did not start as {}: {}",
                command.program,
                identity,
                output.stderr.trim()
            )));
        }
        Ok(output)
    }
}
