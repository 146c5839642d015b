//! External check execution.
//!
//! Runs one external command to completion and turns its termination into a
//! `CheckResult`.
//!
//! Every check is spawned as the leader of its own process group. Once the
//! leader has exited, timed out or could not be waited on, the whole group
//! is killed, so nothing a check started outlives it.
//!
//! # Graceful Degradation
//!
//! Running a check never returns an error:
//! - Program missing or not executable: `CheckStatus::LaunchFailed`
//! - Killed by a signal: `CheckStatus::Terminated`
//! - Timeout elapsed: group gets SIGTERM, then SIGKILL, `CheckStatus::TimedOut`
//! - Non-UTF8 output: lossy conversion
//!
//! All of these are failures of the check, never a pass.

use crate::config::{CheckDefinition, GateConfig};
use crate::engine::orchestrator::RegisteredCheck;
use crate::{CheckResult, CheckStatus};
use command_group::{CommandGroup, GroupChild};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Captured output keeps only this many trailing bytes per stream.
pub const MAX_CAPTURED_BYTES: usize = 64 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Time between SIGTERM and SIGKILL for a timed-out check.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Upper bound on draining captured pipes after the group was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A fully resolved external check.
#[derive(Debug, Clone)]
pub struct ExternalCheck {
    pub id: String,
    pub name: String,
    pub description: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub capture_output: bool,
}

impl ExternalCheck {
    /// Resolve a config definition against the gate root.
    pub fn from_definition(def: &CheckDefinition, config: &GateConfig, root: &Path) -> Self {
        let working_dir = match &def.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };

        ExternalCheck {
            id: def.id.clone(),
            name: def.display_name().to_string(),
            description: def.description.clone(),
            program: resolve_program(&def.command, &working_dir),
            args: def.args.clone(),
            working_dir,
            env: def.env.clone(),
            timeout: def.effective_timeout_ms(config).map(Duration::from_millis),
            capture_output: def.effective_capture_output(config),
        }
    }

    /// Program and arguments as a single display string
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the command and wait for it and everything it started to finish.
    pub fn run(&self) -> CheckResult {
        let start = Instant::now();
        tracing::debug!(
            check = %self.id,
            command = %self.command_line(),
            cwd = %self.working_dir.display(),
            "launching external check"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::null());

        if self.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            // stdout is reserved for the verdict
            command.stdout(Stdio::from(io::stderr())).stderr(Stdio::inherit());
        }

        let mut child = match command.group_spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(check = %self.id, error = %e, "failed to launch check");
                return CheckResult::with_status(
                    CheckStatus::LaunchFailed {
                        reason: format!("{}: {}", self.program.display(), e),
                    },
                    elapsed_ms(start),
                );
            }
        };

        let stdout_reader = child.inner().stdout.take().map(TailReader::spawn);
        let stderr_reader = child.inner().stderr.take().map(TailReader::spawn);

        let status = match wait_with_timeout(&mut child, self.timeout) {
            Ok(Some(exit_status)) => {
                terminate_group(&mut child, Duration::ZERO);
                status_from_exit(exit_status)
            }
            Ok(None) => {
                let timeout_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
                tracing::warn!(check = %self.id, timeout_ms, "check timed out, terminating");
                terminate_group(&mut child, GRACE_PERIOD);
                CheckStatus::TimedOut { timeout_ms }
            }
            Err(e) => {
                tracing::error!(check = %self.id, error = %e, "failed to wait for check");
                terminate_group(&mut child, Duration::ZERO);
                CheckStatus::Terminated { signal: None }
            }
        };

        // A process that left the group may still hold a pipe open
        let drain_deadline = Instant::now() + DRAIN_GRACE;
        let stdout = stdout_reader.map(|reader| reader.finish(drain_deadline));
        let stderr = stderr_reader.map(|reader| reader.finish(drain_deadline));

        CheckResult {
            status,
            duration_ms: elapsed_ms(start),
            stdout,
            stderr,
        }
    }

    /// Wrap this check for the orchestrator.
    pub fn into_registered(self) -> RegisteredCheck {
        RegisteredCheck {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            check_fn: Box::new(move || self.run()),
        }
    }
}

/// Resolve a relative program path containing a directory against the
/// working directory. Bare names are left for `PATH` lookup.
pub fn resolve_program(command: &str, working_dir: &Path) -> PathBuf {
    let path = Path::new(command);
    if path.is_relative() && path.components().count() > 1 {
        working_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Keep the last `max` bytes and decode them lossily.
pub fn tail_lossy(bytes: &[u8], max: usize) -> String {
    let start = bytes.len().saturating_sub(max);
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn status_from_exit(status: ExitStatus) -> CheckStatus {
    match status.code() {
        Some(code) => CheckStatus::Exited { code },
        None => CheckStatus::Terminated {
            signal: exit_signal(&status),
        },
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Wait for the group leader. `Ok(None)` means the timeout elapsed; the
/// caller is responsible for terminating the group.
fn wait_with_timeout(child: &mut GroupChild, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.inner().wait().map(Some);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.inner().try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the check's process group and reap its leader.
///
/// With a non-zero `grace` the group first gets SIGTERM and the leader up to
/// `grace` to exit. Whatever is left of the group is then sent SIGKILL.
#[cfg(unix)]
fn terminate_group(child: &mut GroupChild, grace: Duration) {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let pid = child.inner().id();
    let pgid = Pid::from_raw(-(pid as i32));

    if !grace.is_zero() {
        if let Err(e) = signal::kill(pgid, Signal::SIGTERM) {
            if e != Errno::ESRCH {
                tracing::warn!(pid, error = ?e, "SIGTERM to process group failed");
            }
        }

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if child.inner().try_wait().ok().flatten().is_some() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    if let Err(e) = signal::kill(pgid, Signal::SIGKILL) {
        if e != Errno::ESRCH {
            tracing::warn!(pid, error = ?e, "SIGKILL to process group failed");
            let _ = child.inner().kill();
        }
    }

    // Returns the cached status when the leader was already reaped
    let _ = child.inner().wait();
}

#[cfg(not(unix))]
fn terminate_group(child: &mut GroupChild, _grace: Duration) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Drains one pipe on a helper thread, keeping the trailing bytes.
struct TailReader {
    handle: JoinHandle<()>,
    kept: Arc<Mutex<Vec<u8>>>,
}

impl TailReader {
    fn spawn<R>(mut stream: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let kept = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&kept);

        let handle = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut kept = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                        kept.extend_from_slice(&chunk[..n]);
                        if kept.len() > 2 * MAX_CAPTURED_BYTES {
                            let excess = kept.len() - MAX_CAPTURED_BYTES;
                            kept.drain(..excess);
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });

        TailReader { handle, kept }
    }

    /// Wait for end of stream until `deadline`, then return what was read.
    fn finish(self, deadline: Instant) -> String {
        while !self.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }

        if self.handle.is_finished() {
            let _ = self.handle.join();
        } else {
            tracing::debug!("output pipe still open, keeping partial capture");
        }

        let kept = self.kept.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tail_lossy(&kept, MAX_CAPTURED_BYTES)
    }
}
