//! Child process execution with captured output and a hard deadline.

use std::{
    path::PathBuf,
    process::Stdio,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};

/// One program invocation: what to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: cwd.into() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `program arg1 arg2` for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Command error: failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. The message is the child's own diagnostic text.
    #[error("{diagnostic}")]
    Exit { code: Option<i32>, diagnostic: String },

    #[error("Execution timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Command error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Run `inv` to completion and return its standard output.
///
/// A non-zero exit reports standard error, falling back to standard output
/// and then to the exit code. Past `limit` the child is killed (on Unix its
/// whole process group, so toolchain drivers such as `go run` do not leave
/// the built program behind).
pub async fn run(inv: &Invocation, limit: Duration) -> Result<String, RunError> {
    debug!(command = %inv.display(), cwd = %inv.cwd.display(), "spawning");

    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .current_dir(&inv.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|source| RunError::Spawn {
        program: inv.program.clone(),
        source,
    })?;
    let pid = child.id();

    let started = Instant::now();
    let out = match timeout(limit, child.wait_with_output()).await {
        Ok(out) => out?,
        Err(_) => {
            warn!(command = %inv.display(), ?limit, "deadline exceeded, killing child");
            if let Some(pid) = pid {
                kill_group(pid);
            }
            return Err(RunError::Timeout { limit });
        }
    };
    debug!(status = ?out.status, elapsed = ?started.elapsed(), "child exited");

    let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
    if out.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&out.stderr);
    let code = out.status.code();
    let diagnostic = if !stderr.trim().is_empty() {
        stderr.into_owned()
    } else if !stdout.trim().is_empty() {
        stdout
    } else {
        match code {
            Some(c) => format!("exited with code {}", c),
            None => "terminated by signal".to_string(),
        }
    };
    Err(RunError::Exit { code, diagnostic })
}

/// Run a sequence of invocations under one shared deadline, stopping at the
/// first failure. Returns the output of the last one.
pub async fn run_sequence(steps: &[&Invocation], limit: Duration) -> Result<String, RunError> {
    let deadline = Instant::now() + limit;
    let mut last = String::new();
    for inv in steps {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RunError::Timeout { limit });
        }
        last = run(inv, remaining).await.map_err(|e| match e {
            RunError::Timeout { .. } => RunError::Timeout { limit },
            other => other,
        })?;
    }
    Ok(last)
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    // SAFETY: killpg only sends a signal; the group was created for this child.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {
    // The direct child is killed when its handle drops (`kill_on_drop`).
}
