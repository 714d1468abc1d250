//! Subprocess execution with combined output capture, timeout and cancellation

use crate::error::{CvtexError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How often the child is polled for exit, timeout and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to keep collecting output after the child is gone
///
/// Grandchildren may inherit the pipes and keep them open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Options for running an external program
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// `None` waits forever
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl ExecOptions {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout: None,
            cancel: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// How the program finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exited on its own; `code` is `None` when terminated by a signal
    Exited { code: Option<i32>, success: bool },
    /// Killed after exceeding the timeout
    TimedOut,
    /// Killed because the cancellation token fired
    Cancelled,
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Exited { success: true, .. })
    }
}

/// Result of running a program
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub outcome: ExecOutcome,
    /// stdout and stderr interleaved in the order chunks arrived
    pub output: String,
    pub duration_ms: u64,
}

/// Run a program to completion, timeout or cancellation
///
/// Stdin is closed. Spawn failures are returned as `Err`; every other
/// outcome, including a non-zero exit, is an `Ok` result.
pub fn run(options: &ExecOptions) -> std::io::Result<ExecResult> {
    debug!(
        program = %options.program.display(),
        args = ?options.args,
        cwd = %options.cwd.display(),
        "spawning process"
    );

    let start = Instant::now();
    let mut command = Command::new(&options.program);
    command
        .args(&options.args)
        .current_dir(&options.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // The driver's own children (lualatex, biber) share its process group
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn()?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, tx.clone());
    }
    drop(tx);

    let mut output = Vec::new();
    let outcome = wait_for_exit(&mut child, options, start, &rx, &mut output)?;
    drain(&rx, &mut output);

    Ok(ExecResult {
        outcome,
        output: String::from_utf8_lossy(&output).into_owned(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R, tx: mpsc::Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match source.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn wait_for_exit(
    child: &mut Child,
    options: &ExecOptions,
    start: Instant,
    rx: &Receiver<Vec<u8>>,
    output: &mut Vec<u8>,
) -> std::io::Result<ExecOutcome> {
    let mut pipes_open = true;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(ExecOutcome::Exited {
                code: status.code(),
                success: status.success(),
            });
        }

        if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            debug!(program = %options.program.display(), "cancelled, killing process");
            kill(child);
            return Ok(ExecOutcome::Cancelled);
        }

        if let Some(timeout) = options.timeout {
            if start.elapsed() >= timeout {
                warn!(
                    program = %options.program.display(),
                    timeout_secs = timeout.as_secs(),
                    "process timed out, killing"
                );
                kill(child);
                return Ok(ExecOutcome::TimedOut);
            }
        }

        if pipes_open {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => output.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => pipes_open = false,
            }
        } else {
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Kill the child and everything it started, then reap it
#[cfg(unix)]
fn kill(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        debug!(error = %e, "killpg failed, falling back to killing the child");
        if let Err(e) = child.kill() {
            debug!(error = %e, "kill failed, process may have exited");
        }
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "kill failed, process may have exited");
    }
    let _ = child.wait();
}

fn drain(rx: &Receiver<Vec<u8>>, output: &mut Vec<u8>) {
    let deadline = Instant::now() + DRAIN_GRACE;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => output.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                debug!("output pipes still open after exit, giving up on remaining output");
                return;
            }
        }
    }
}

/// Locate a compiler executable
///
/// A bare name is looked up on `PATH`; anything with a directory component is
/// taken as a path relative to the current directory.
pub fn resolve_compiler(program: &str) -> Result<PathBuf> {
    let not_found = |reason: String| CvtexError::CompilerSpawn {
        program: program.to_string(),
        reason,
        workdir: None,
    };

    let path = Path::new(program);
    if path.components().count() > 1 || path.is_absolute() {
        let absolute = std::path::absolute(path)?;
        if absolute.is_file() {
            return Ok(absolute);
        }
        return Err(not_found("no such file".to_string()));
    }

    which::which(program).map_err(|e| not_found(e.to_string()))
}
