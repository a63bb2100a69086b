//! Isolated task: one child process per project
//!
//! The child's stdout and stderr are drained concurrently while it runs and
//! every line is forwarded into the log under the project's identity, stdout
//! at info level and stderr at error level.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("failed to start child process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed waiting for child process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("child process killed after {0:?}")]
    TimedOut(Duration),

    #[error("child process terminated abnormally ({0})")]
    AbnormalExit(ExitStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// A child process scoring a single project.
#[derive(Debug, Clone)]
pub struct IsolatedTask {
    project: String,
    program: PathBuf,
    args: Vec<OsString>,
    memory_limit_mb: u64,
    timeout: Option<Duration>,
}

impl IsolatedTask {
    pub fn new(project: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        IsolatedTask {
            project: project.into(),
            program: program.into(),
            args: Vec::new(),
            memory_limit_mb: 0,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Address-space cap for the child in MiB; `0` leaves it unlimited.
    pub fn memory_limit_mb(mut self, limit: u64) -> Self {
        self.memory_limit_mb = limit;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the child to completion. A non-zero exit or death by signal is
    /// [`TaskError::AbnormalExit`].
    pub async fn run(self) -> Result<ExitStatus, TaskError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        apply_memory_limit(&mut command, self.memory_limit_mb);

        let mut child = command.spawn().map_err(TaskError::Spawn)?;
        tracing::debug!(project = %self.project, "Started child process {:?}", child.id());

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward(out, self.project.clone(), Stream::Stdout)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward(err, self.project.clone(), Stream::Stderr)));

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(project = %self.project, "Failed to kill child: {}", e);
                    }
                    for forwarder in stdout.into_iter().chain(stderr) {
                        forwarder.abort();
                    }
                    return Err(TaskError::TimedOut(limit));
                }
            },
            None => child.wait().await,
        };

        // Drain whatever the child wrote before exiting.
        for forwarder in stdout.into_iter().chain(stderr) {
            if let Err(e) = forwarder.await {
                tracing::warn!(project = %self.project, "Output forwarder failed: {}", e);
            }
        }

        let status = waited.map_err(TaskError::Wait)?;
        if status.success() {
            Ok(status)
        } else {
            Err(TaskError::AbnormalExit(status))
        }
    }
}

async fn forward<R: AsyncRead + Unpin>(reader: R, project: String, stream: Stream) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                match stream {
                    Stream::Stdout => tracing::info!(project = %project, "{}", line),
                    Stream::Stderr => tracing::error!(project = %project, "{}", line),
                }
            }
            Err(e) => {
                tracing::warn!(project = %project, "Failed to read child output: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
fn apply_memory_limit(command: &mut Command, limit_mb: u64) {
    if limit_mb == 0 {
        return;
    }
    let requested = limit_mb.saturating_mul(1024 * 1024) as libc::rlim_t;

    // SAFETY: the closure runs between fork and exec and only calls the
    // async-signal-safe getrlimit/setrlimit.
    unsafe {
        command.pre_exec(move || {
            let mut current = libc::rlimit {
                rlim_cur: 0,
                rlim_max: 0,
            };
            if libc::getrlimit(libc::RLIMIT_AS, &mut current) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            let bytes = if current.rlim_max == libc::RLIM_INFINITY {
                requested
            } else {
                requested.min(current.rlim_max)
            };
            let limit = libc::rlimit {
                rlim_cur: bytes,
                rlim_max: current.rlim_max,
            };
            if libc::setrlimit(libc::RLIMIT_AS, &limit) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}
