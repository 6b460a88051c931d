use crate::provider::invocation::build_invocation;
use crate::provider::{CancelToken, InvocationContext, ProviderError, RunOutput, Runner};
use std::io::{BufReader, Read, Write};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long output readers may lag behind a killed backend before their data is dropped.
const STOP_GRACE: Duration = Duration::from_millis(200);

/// Runs one prompt against one backend and waits for it, bounded by the context
/// timeout and the cancel token. Stdout comes first in the combined output,
/// followed by stderr.
///
/// On unix the backend leads its own process group, so stopping it also stops
/// helpers it spawned that share its output pipes.
pub fn run_prompt(
    runner: &Runner,
    prompt: &str,
    context: &InvocationContext,
    cancel: &CancelToken,
) -> RunOutput {
    let spec = build_invocation(runner, prompt, &context.schema_path);
    let backend = runner.backend;

    let mut command = Command::new(&spec.binary);
    command
        .args(&spec.args)
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return failed(ProviderError::MissingBinary {
                backend,
                binary: spec.binary,
            })
        }
        Err(source) => {
            return failed(ProviderError::Io {
                binary: spec.binary,
                source,
            })
        }
    };

    if let Some(input) = spec.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            thread::spawn(move || {
                let _ = stdin.write_all(input.as_bytes());
            });
        }
    }

    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let start = Instant::now();
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let stop = if cancel.is_cancelled() {
                    Some(ProviderError::Cancelled { backend })
                } else if start.elapsed() > context.timeout {
                    Some(ProviderError::Timeout {
                        backend,
                        timeout_ms: timeout_millis(context.timeout),
                    })
                } else {
                    None
                };
                if let Some(error) = stop {
                    stop_child(&mut child);
                    return RunOutput {
                        output: collect_output(stdout_reader, stderr_reader, STOP_GRACE),
                        error: Some(error),
                    };
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(source) => {
                stop_child(&mut child);
                let _ = collect_output(stdout_reader, stderr_reader, STOP_GRACE);
                return failed(ProviderError::Io {
                    binary: spec.binary,
                    source,
                });
            }
        }
    };

    let remaining = context.timeout.saturating_sub(start.elapsed()).max(STOP_GRACE);
    let output = collect_output(stdout_reader, stderr_reader, remaining);
    let error = if exit_status.success() {
        None
    } else {
        Some(ProviderError::NonZeroExit {
            backend,
            exit_code: exit_status.code().unwrap_or(-1),
        })
    };
    RunOutput { output, error }
}

type Reader = Option<Receiver<Vec<u8>>>;

fn spawn_reader<R: Read + Send + 'static>(stream: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = BufReader::new(stream).read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Kills the backend's process group, then the backend itself, and reaps it.
fn stop_child(child: &mut Child) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .arg("-KILL")
            .arg(format!("-{}", child.id()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Gathers reader output, giving up on a stream still held open after `limit`.
fn collect_output(stdout_reader: Reader, stderr_reader: Reader, limit: Duration) -> Vec<u8> {
    let deadline = Instant::now().checked_add(limit);
    let take = |reader: Reader| {
        reader
            .and_then(|rx| match deadline {
                Some(deadline) => rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    .ok(),
                None => rx.recv().ok(),
            })
            .unwrap_or_default()
    };
    let mut output = take(stdout_reader);
    output.extend(take(stderr_reader));
    output
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

fn failed(error: ProviderError) -> RunOutput {
    RunOutput {
        output: Vec::new(),
        error: Some(error),
    }
}
