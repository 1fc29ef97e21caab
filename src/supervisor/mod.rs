//! Lifecycle of the supervised lnd process.
//!
//! A [`ProcessSupervisor`] locates the binary, optionally runs the one-shot
//! version query, and otherwise starts the daemon and hands its stdout back
//! as a [`LineStream`]. It is single-use: one child per instance.

mod handle;
mod launcher;
mod lines;


pub use handle::ExitOutcome;
pub use launcher::{find_executable, Launcher, SystemLauncher};
pub use lines::{LineStream, MAX_LINE_LEN};

use crate::error::{ConduitError, Result};
use handle::ProcessHandle;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Sentinel returned by [`ProcessSupervisor::run_version_query`].
///
/// Not an error: the run is intentionally over once the version is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequested {
    /// First line the child printed, without terminator
    pub version: String,
}

pub struct ProcessSupervisor {
    binary: String,
    launcher: Arc<dyn Launcher>,
    resolved: Option<PathBuf>,
    handle: Option<ProcessHandle>,
    started: bool,
}

impl ProcessSupervisor {
    /// Supervisor for `binary`, resolved against the host `PATH`.
    pub fn new<S: Into<String>>(binary: S) -> Self {
        Self::with_launcher(binary, Arc::new(SystemLauncher))
    }

    pub fn with_launcher<S: Into<String>>(binary: S, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            binary: binary.into(),
            launcher,
            resolved: None,
            handle: None,
            started: false,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// OS process id of the running child.
    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().and_then(|handle| handle.pid)
    }

    /// Resolve the binary on the search path. Never spawns anything.
    pub fn locate(&mut self) -> Result<PathBuf> {
        match self.launcher.resolve(&self.binary) {
            Some(path) => {
                debug!("Resolved {} to {}", self.binary, path.display());
                self.resolved = Some(path.clone());
                Ok(path)
            }
            None => {
                debug!("{} command not found on PATH", self.binary);
                Err(ConduitError::NotFound {
                    binary: self.binary.clone(),
                })
            }
        }
    }

    fn resolved_path(&mut self) -> Result<PathBuf> {
        match &self.resolved {
            Some(path) => Ok(path.clone()),
            None => self.locate(),
        }
    }

    fn command(path: &Path, args: &[String]) -> Command {
        let mut command = Command::new(path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }

    /// Run `<binary> <args>` once, echo its first output line to `echo`, and
    /// wait for it to exit.
    pub async fn run_version_query<W: Write + ?Sized>(
        &mut self,
        args: &[String],
        echo: &mut W,
    ) -> Result<VersionRequested> {
        let path = self.resolved_path()?;
        let mut command = Self::command(&path, args);

        debug!("Running version query: {} {:?}", path.display(), args);
        let mut child = self
            .launcher
            .spawn(&mut command)
            .map_err(|e| ConduitError::spawn_failed(self.binary.clone(), e.to_string()))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill version query process: {}", e);
                }
                return Err(ConduitError::spawn_failed(
                    self.binary.clone(),
                    "failed to capture stdout".to_string(),
                ));
            }
        };

        // Stop at the child's exit, not at end of output: a background
        // process it left behind may keep the pipe open.
        let mut lines = LineStream::new(stdout);
        let mut version = None;
        let mut reading = true;
        let status = loop {
            tokio::select! {
                biased;
                line = lines.next_line(), if reading => match line {
                    Ok(Some(line)) => {
                        if version.is_none() {
                            writeln!(echo, "{}", line)?;
                            echo.flush()?;
                            version = Some(line);
                        }
                    }
                    Ok(None) => reading = false,
                    Err(e) => {
                        debug!("Stopped reading version query output: {}", e);
                        reading = false;
                    }
                },
                status = child.wait() => break status?,
            }
        };

        let outcome = ExitOutcome::from(status);
        if !outcome.success() {
            debug!("{} version query {}", self.binary, outcome);
            return Err(ConduitError::VersionQuery { outcome });
        }

        info!("{} --version called. Gracefully exiting now...", self.binary);
        Ok(VersionRequested {
            version: version.unwrap_or_default(),
        })
    }

    /// Spawn the child for long-running supervision.
    ///
    /// Returns immediately with the child's stdout; use [`wait`](Self::wait)
    /// to block on exit. On any failure no child is left running.
    pub fn start(&mut self, args: &[String]) -> Result<LineStream<ChildStdout>> {
        if self.started {
            return Err(ConduitError::AlreadyStarted);
        }

        let path = self.resolved_path()?;
        let mut command = Self::command(&path, args);
        self.started = true;

        info!("Starting {} {}", path.display(), args.join(" "));
        let mut child = self
            .launcher
            .spawn(&mut command)
            .map_err(|e| ConduitError::spawn_failed(self.binary.clone(), e.to_string()))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                // kill_on_drop reaps it as well; this just doesn't wait for the drop
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill {} after pipe failure: {}", self.binary, e);
                }
                return Err(ConduitError::spawn_failed(
                    self.binary.clone(),
                    "failed to capture stdout".to_string(),
                ));
            }
        };

        let handle = ProcessHandle::new(child);
        info!(
            "{} started (PID: {})",
            self.binary,
            handle
                .pid
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        self.handle = Some(handle);

        Ok(LineStream::new(stdout))
    }

    /// Non-blocking check for exit.
    pub fn try_wait(&mut self) -> Result<Option<ExitOutcome>> {
        let handle = self.handle.as_mut().ok_or(ConduitError::NotStarted)?;
        if let Some(outcome) = handle.outcome {
            return Ok(Some(outcome));
        }

        let outcome = handle.child.try_wait()?.map(ExitOutcome::from);
        handle.outcome = outcome;
        Ok(outcome)
    }

    /// Block until the child exits.
    ///
    /// Only call once nothing is reading the output stream any more.
    pub async fn wait(&mut self) -> Result<ExitOutcome> {
        let handle = self.handle.as_mut().ok_or(ConduitError::NotStarted)?;
        if let Some(outcome) = handle.outcome {
            return Ok(outcome);
        }

        let outcome = ExitOutcome::from(handle.child.wait().await?);
        handle.outcome = Some(outcome);
        info!("{} {}", self.binary, outcome);
        Ok(outcome)
    }

    /// Ask the child to shut down gracefully (SIGTERM on Unix).
    pub fn request_stop(&mut self) -> Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }
        let binary = self.binary.clone();
        let handle = self.handle.as_mut().ok_or(ConduitError::NotStarted)?;

        #[cfg(unix)]
        {
            let Some(pid) = handle.child.id() else {
                return Ok(());
            };
            let pid = libc::pid_t::try_from(pid)
                .map_err(|_| ConduitError::system(format!("PID {} out of range", pid)))?;

            // SAFETY: kill(2) has no memory-safety preconditions
            let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::ESRCH) {
                    return Ok(());
                }
                return Err(err.into());
            }
            info!("Sent SIGTERM to {} (PID: {})", binary, pid);
            Ok(())
        }

        #[cfg(not(unix))]
        {
            handle.child.start_kill()?;
            info!("Terminated {}", binary);
            Ok(())
        }
    }

    /// Forcibly terminate the child.
    pub fn kill(&mut self) -> Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }
        let handle = self.handle.as_mut().ok_or(ConduitError::NotStarted)?;
        handle.child.start_kill()?;
        warn!("Killed {}", self.binary);
        Ok(())
    }

    /// Graceful stop with escalation: request stop, wait up to `grace`,
    /// then kill and reap.
    pub async fn stop(&mut self, grace: Duration) -> Result<ExitOutcome> {
        if let Some(outcome) = self.try_wait()? {
            return Ok(outcome);
        }

        self.request_stop()?;
        match timeout(grace, self.wait()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} did not exit within {:?} of stop request, killing",
                    self.binary, grace
                );
                self.kill()?;
                self.wait().await
            }
        }
    }
}
