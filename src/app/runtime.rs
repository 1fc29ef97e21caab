use super::drain::drain_lines;
use super::startup::Launched;
use super::types::{DrainEnd, DRAIN_COMPONENT, LND_COMPONENT};
use super::{ComponentState, Orchestrator, OrchestratorState, RunOutcome};
use crate::error::{ConduitError, Result};
use crate::shutdown::ShutdownReason;
use std::sync::Arc;
use tracing::{info, warn};

impl Orchestrator {
    /// Run the daemon until shutdown is requested or it exits on its own.
    ///
    /// Returns only after the drain loop has finished and the child has been
    /// reaped, so no record is forwarded once this resolves. A child that
    /// exits while supervised is reported as [`ConduitError::UnexpectedExit`].
    pub async fn run(&mut self) -> Result<RunOutcome> {
        if self.ran {
            return Err(ConduitError::AlreadyStarted);
        }
        self.ran = true;

        let lines = match self.start_child().await {
            Ok(Launched::Version(requested)) => {
                self.state = OrchestratorState::ShuttingDown;
                return Ok(RunOutcome::VersionRequested {
                    version: requested.version,
                });
            }
            Ok(Launched::Supervising(lines)) => lines,
            Err(e) => {
                self.shutdown.request(ShutdownReason::Error(e.to_string()));
                self.state = OrchestratorState::ShuttingDown;
                return Err(e);
            }
        };

        self.state = OrchestratorState::Supervising;
        let mut drain = tokio::spawn(drain_lines(
            lines,
            self.translator,
            Arc::clone(&self.sink),
            self.shutdown.clone(),
        ));
        self.set_component_state(DRAIN_COMPONENT, ComponentState::Running)
            .await;
        info!(
            "Supervising {} (PID: {})",
            self.supervisor.binary(),
            self.pid()
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        // Wait for shutdown signal, or for the child's output to end first
        let shutdown = self.shutdown.clone();
        let finished_early = tokio::select! {
            _ = shutdown.done() => None,
            joined = &mut drain => Some(joined),
        };
        let joined = match finished_early {
            Some(joined) => joined,
            None => drain.await,
        };

        let (lines, report) = match joined {
            Ok(drained) => drained,
            Err(e) => {
                warn!("Log drain task failed: {}", e);
                self.set_component_state(DRAIN_COMPONENT, ComponentState::Failed)
                    .await;
                let err = ConduitError::system(format!("log drain task failed: {}", e));
                self.shutdown.request(ShutdownReason::Error(err.to_string()));
                self.state = OrchestratorState::ShuttingDown;
                if let Err(stop_err) = self.supervisor.stop(self.settings.stop_timeout()).await {
                    warn!("Error stopping {} component: {}", LND_COMPONENT, stop_err);
                }
                self.set_component_state(LND_COMPONENT, ComponentState::Stopped)
                    .await;
                self.shutdown.mark_drained();
                return Err(err);
            }
        };
        self.set_component_state(DRAIN_COMPONENT, ComponentState::Stopped)
            .await;
        info!(
            "Log drain stopped: {} records forwarded, {} lines skipped",
            report.forwarded, report.dropped
        );

        if report.end == DrainEnd::Cancelled || self.shutdown.is_requested() {
            self.shutdown_child(lines).await
        } else {
            self.handle_child_exit(lines, report).await
        }
    }
}
