// Prompt-driven su/sudo session.
//
// The secret and the command's own input travel over the same stdin pipe,
// so nothing is written before it is asked for. The secret goes out once per
// password prompt seen on stderr, and the command's input only after the
// target shell prints the ready marker right before it execs the command.
// Both markers are fresh for every session.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::CommandOutput;
use crate::auth::Secret;
use crate::failure::DomainFailure;

/// Tail of the prompt PAM's text conversation prints on stderr for `su`
const SU_PROMPT: &[u8] = b"password:";

/// Per-session markers. The sudo prompt is passed with `-p`, the ready
/// marker is printed by the target shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Markers {
    pub sudo_prompt: String,
    pub ready: String,
}

impl Markers {
    pub fn new() -> Self {
        let id = Uuid::new_v4().simple();
        Self {
            sudo_prompt: format!("[host-admin-api:sudo:{}]", id),
            ready: format!("[host-admin-api:ready:{}]", id),
        }
    }
}

/// What happened during one session
#[derive(Debug, Clone, Default)]
pub(crate) struct Transcript {
    pub output: CommandOutput,
    /// `su` asked for the secret and was given it
    pub su_prompted: bool,
    /// `sudo` asked for the secret and was given it
    pub sudo_prompted: bool,
    /// The target command was reached
    pub started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    SuPrompt,
    SudoPrompt,
    Ready,
}

fn find(haystack: &[u8], needle: &[u8], ignore_case: bool) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| {
        if ignore_case {
            window.eq_ignore_ascii_case(needle)
        } else {
            window == needle
        }
    })
}

/// Earliest cue in `text`, as (start, end, cue)
fn next_cue(text: &[u8], markers: &Markers) -> Option<(usize, usize, Cue)> {
    let ready = markers.ready.as_bytes();
    let sudo = markers.sudo_prompt.as_bytes();

    [
        find(text, ready, false).map(|at| (at, at + ready.len(), Cue::Ready)),
        find(text, sudo, false).map(|at| (at, at + sudo.len(), Cue::SudoPrompt)),
        find(text, SU_PROMPT, true).map(|at| (at, at + SU_PROMPT.len(), Cue::SuPrompt)),
    ]
    .into_iter()
    .flatten()
    .min_by_key(|(start, _, _)| *start)
}

/// Write the secret once. A prompt that repeats means the secret was
/// refused, so the pipe is closed instead and the asker fails on EOF.
async fn answer(stdin: &mut Option<ChildStdin>, answered: &mut bool, secret: &Secret) {
    if *answered {
        *stdin = None;
        return;
    }
    *answered = true;

    if let Some(pipe) = stdin.as_mut() {
        let line = format!("{}\n", secret.expose());
        if pipe.write_all(line.as_bytes()).await.is_err() || pipe.flush().await.is_err() {
            *stdin = None;
        }
    }
}

async fn feed(mut pipe: ChildStdin, input: Option<String>) {
    if let Some(input) = input {
        if let Err(e) = pipe.write_all(input.as_bytes()).await {
            tracing::debug!("command stdin closed early: {}", e);
        }
    }
}

/// Run the conversation with an already spawned `su` until it exits.
/// The caller bounds this with the command timeout.
pub(crate) async fn drive(
    mut child: Child,
    secret: &Secret,
    markers: &Markers,
    mut input: Option<String>,
) -> Result<Transcript, DomainFailure> {
    let mut stdin = child.stdin.take();
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| DomainFailure::execution("su stdout is not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| DomainFailure::execution("su stderr is not captured"))?;

    let mut transcript = Transcript::default();
    let mut out = Vec::new();
    let mut err = Vec::new();
    // stderr before this offset holds no cue
    let mut scanned = 0;
    let mut feeder: Option<JoinHandle<()>> = None;

    let (mut out_open, mut err_open) = (true, true);
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_chunk), if out_open => match read? {
                0 => out_open = false,
                n => out.extend_from_slice(&out_chunk[..n]),
            },
            read = stderr.read(&mut err_chunk), if err_open => match read? {
                0 => err_open = false,
                n => {
                    err.extend_from_slice(&err_chunk[..n]);

                    while !transcript.started {
                        let Some((start, end, cue)) = next_cue(&err[scanned..], markers) else {
                            break;
                        };
                        let (mut start, mut end) = (scanned + start, scanned + end);

                        match cue {
                            Cue::SuPrompt | Cue::SudoPrompt => {
                                if cue == Cue::SuPrompt {
                                    // Drop the whole prompt line, e.g. "Password: "
                                    start = err[scanned..start]
                                        .iter()
                                        .rposition(|b| *b == b'\n')
                                        .map_or(scanned, |i| scanned + i + 1);
                                }
                                while err.get(end) == Some(&b' ') {
                                    end += 1;
                                }
                                err.drain(start..end);
                                scanned = start;

                                let answered = match cue {
                                    Cue::SuPrompt => &mut transcript.su_prompted,
                                    _ => &mut transcript.sudo_prompted,
                                };
                                answer(&mut stdin, answered, secret).await;
                            }
                            Cue::Ready => {
                                if err.get(end) == Some(&b'\n') {
                                    end += 1;
                                }
                                err.drain(start..end);
                                scanned = start;
                                transcript.started = true;
                                feeder = stdin.take().map(|pipe| tokio::spawn(feed(pipe, input.take())));
                            }
                        }
                    }
                }
            },
        }
    }

    drop(stdin);
    let status = child.wait().await?;
    if let Some(feeder) = feeder {
        feeder.abort();
    }

    transcript.output = CommandOutput {
        status: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    };
    Ok(transcript)
}
