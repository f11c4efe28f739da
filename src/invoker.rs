//! Process Invoker - runs the proving command under a wall-clock budget
//!
//! Standard output and standard error are read concurrently and merged line
//! by line in arrival order, so the classifier sees one stream the way a
//! terminal would show it. A run that outlives its budget is killed (on
//! Unix together with its whole process group) and reaped before
//! [`InvokeError::TimedOut`] is returned.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::config::MonitorConfig;
use crate::error::InvokeError;

/// Output of a run that exited on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    /// Merged stdout/stderr text
    pub text: String,
    /// Exit code, `None` if the process was ended by a signal
    pub exit_code: Option<i32>,
}

impl Captured {
    /// Create captured output.
    #[must_use]
    pub fn new(text: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            text: text.into(),
            exit_code,
        }
    }

    fn from_status(text: String, status: ExitStatus) -> Self {
        Self {
            text,
            exit_code: status.code(),
        }
    }
}

/// Something that can produce one run's output per call.
///
/// [`ProcessInvoker`] is the real implementation; tests drive the monitor
/// with scripted invokers.
pub trait Invoke {
    /// Run once and return the captured output.
    fn invoke(&mut self) -> impl Future<Output = Result<Captured, InvokeError>> + Send;

    /// Human-readable description of what is invoked, for logs.
    fn describe(&self) -> String {
        String::from("<invoker>")
    }
}

/// Runs a fixed program with fixed arguments.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ProcessInvoker {
    /// Create an invoker for `program args...` with the given budget.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
            timeout,
        }
    }

    /// Create an invoker from the monitor configuration.
    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        let mut invoker = Self::new(&config.program, &config.args, config.timeout());
        invoker.working_dir.clone_from(&config.working_dir);
        invoker
    }

    /// Run the command from `dir` instead of the current directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Wall-clock budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the command to completion or until the budget elapses.
    ///
    /// A non-zero exit is not an error: the captured text is returned and
    /// left to the classifier.
    ///
    /// # Errors
    ///
    /// - [`InvokeError::Launch`] if the process cannot be spawned
    /// - [`InvokeError::Io`] if reading its output or waiting on it fails
    /// - [`InvokeError::TimedOut`] if the budget elapses first
    #[instrument(skip(self), fields(program = %self.program))]
    pub async fn run(&self) -> Result<Captured, InvokeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| InvokeError::Launch {
            program: self.program.clone(),
            source,
        })?;
        debug!(pid = child.id(), "spawned");

        let outcome = tokio::time::timeout(self.timeout, collect_output(&mut child)).await;
        match outcome {
            Ok(Ok((text, status))) => {
                debug!(exit_code = status.code(), bytes = text.len(), "exited");
                Ok(Captured::from_status(text, status))
            }
            Ok(Err(source)) => {
                terminate(&mut child).await;
                Err(InvokeError::Io {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_elapsed) => {
                terminate(&mut child).await;
                Err(InvokeError::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

impl Invoke for ProcessInvoker {
    fn invoke(&mut self) -> impl Future<Output = Result<Captured, InvokeError>> + Send {
        self.run()
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read both pipes to EOF, merging lines as they arrive, then reap the child.
async fn collect_output(child: &mut Child) -> std::io::Result<(String, ExitStatus)> {
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let mut out_open = true;
    let mut err_open = true;
    let mut text = String::new();

    while out_open || err_open {
        tokio::select! {
            line = out.next_segment(), if out_open => match line? {
                Some(line) => push_line(&mut text, &line),
                None => out_open = false,
            },
            line = err.next_segment(), if err_open => match line? {
                Some(line) => push_line(&mut text, &line),
                None => err_open = false,
            },
        }
    }

    let status = child.wait().await?;
    Ok((text, status))
}

fn push_line(text: &mut String, line: &[u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    text.push_str(&String::from_utf8_lossy(line));
    text.push('\n');
}

fn missing_pipe(name: &str) -> std::io::Error {
    std::io::Error::other(format!("child {name} was not captured"))
}

/// Kill the child (and on Unix its process group) and reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) {
        // SAFETY: killpg has no memory-safety preconditions; the group id is
        // the child's pid because it was spawned with process_group(0).
        let rc = unsafe { libc::killpg(pid, libc::SIGKILL) };
        if rc != 0 {
            debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill timed-out child");
    }
}
