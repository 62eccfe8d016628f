//! Child process runner with an optional deadline
//!
//! Shared by the flash tool and the mediator's bus client, both of which
//! must not hang the caller when the external program does.

use super::{command_line, ToolOutput};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between checks for child exit while a deadline is armed
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `program` with `args`, capturing stdout
///
/// `name` is how the program appears in log and error messages. A child
/// still running when `timeout` expires is killed and reaped, and the call
/// fails with [`Error::ToolTimeout`].
pub(crate) fn run(
    program: &Path,
    name: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<ToolOutput> {
    let command = command_line(name, args);
    debug!("Running {}", command);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    match timeout {
        Some(timeout) => {
            let child = cmd.spawn().map_err(|e| spawn_error(program, e))?;
            wait_with_deadline(program, child, timeout, command)
        }
        None => {
            let out = cmd.output().map_err(|e| spawn_error(program, e))?;
            Ok(finish(
                &command,
                out.status.code(),
                String::from_utf8_lossy(&out.stdout).into_owned(),
                String::from_utf8_lossy(&out.stderr).into_owned(),
            ))
        }
    }
}

fn spawn_error(program: &Path, source: std::io::Error) -> Error {
    Error::ToolSpawn {
        program: program.display().to_string(),
        source,
    }
}

fn wait_with_deadline(
    program: &Path,
    mut child: Child,
    timeout: Duration,
    command: String,
) -> Result<ToolOutput> {
    // Drain the pipes on their own threads so a chatty child cannot
    // block on a full pipe while we poll for exit.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                reap(&mut child);
                return Err(spawn_error(program, e));
            }
        }
        if started.elapsed() >= timeout {
            warn!("{} exceeded {:?}, killing it", command, timeout);
            reap(&mut child);
            return Err(Error::ToolTimeout {
                command,
                secs: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = collect(stdout);
    let errors = collect(stderr);
    Ok(finish(&command, status.code(), output, errors))
}

/// Kill the child if it is still running and wait for it
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("kill of pid {} failed: {}", child.id(), e);
    }
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn finish(command: &str, code: Option<i32>, output: String, errors: String) -> ToolOutput {
    // Killed by a signal: no exit code
    let status = code.unwrap_or(-1);
    if status != 0 && !errors.trim().is_empty() {
        debug!("{} stderr: {}", command, errors.trim());
    }
    ToolOutput { status, output }
}
