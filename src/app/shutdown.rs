use super::types::{DrainReport, LND_COMPONENT};
use super::{ComponentState, Orchestrator, OrchestratorState, RunOutcome};
use crate::error::{ConduitError, Result};
use crate::shutdown::ShutdownReason;
use crate::supervisor::LineStream;
use tokio::io::AsyncRead;
use tokio::time::timeout;
use tracing::{debug, info, warn};

impl Orchestrator {
    /// Stop the child after shutdown was requested.
    ///
    /// Output written while the child winds down is read and thrown away so
    /// it can't stall on a full pipe; none of it reaches the sink.
    pub(super) async fn shutdown_child<R>(&mut self, mut lines: LineStream<R>) -> Result<RunOutcome>
    where
        R: AsyncRead + Unpin,
    {
        self.state = OrchestratorState::ShuttingDown;
        let reason = self
            .shutdown
            .reason()
            .unwrap_or(ShutdownReason::UserRequest);
        info!("Shutdown initiated: {}", reason);

        info!("Stopping {} component", LND_COMPONENT);
        self.set_component_state(LND_COMPONENT, ComponentState::Stopping)
            .await;

        let grace = self.settings.stop_timeout();
        let mut discarded = 0usize;
        let mut open = true;
        let stopped = {
            let stop = self.supervisor.stop(grace);
            tokio::pin!(stop);
            loop {
                tokio::select! {
                    result = &mut stop => break result,
                    line = lines.next_line(), if open => match line {
                        Ok(Some(_)) => discarded += 1,
                        _ => open = false,
                    },
                }
            }
        };
        if discarded > 0 {
            debug!("Discarded {} output lines during shutdown", discarded);
        }

        let result = match stopped {
            Ok(outcome) => {
                self.set_component_state(LND_COMPONENT, ComponentState::Stopped)
                    .await;
                info!("{} component stopped: {}", LND_COMPONENT, outcome);
                Ok(RunOutcome::Stopped { reason, outcome })
            }
            Err(e) => {
                self.set_component_state(LND_COMPONENT, ComponentState::Failed)
                    .await;
                warn!("Error stopping {} component: {}", LND_COMPONENT, e);
                Err(e)
            }
        };

        self.shutdown.mark_drained();
        info!("Conduit shutdown complete");
        result
    }

    /// The child's output ended while nobody asked it to stop.
    ///
    /// If a shutdown request got in first after all, this is an ordinary
    /// stop instead.
    pub(super) async fn handle_child_exit<R>(
        &mut self,
        lines: LineStream<R>,
        report: DrainReport,
    ) -> Result<RunOutcome>
    where
        R: AsyncRead + Unpin,
    {
        if !self.shutdown.request(ShutdownReason::ChildExited) {
            return self.shutdown_child(lines).await;
        }
        drop(lines);

        self.state = OrchestratorState::ShuttingDown;
        warn!(
            "{} output ended while supervised ({:?})",
            LND_COMPONENT, report.end
        );

        let grace = self.settings.stop_timeout();
        let waited = timeout(grace, self.supervisor.wait()).await;
        let outcome = match waited {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} closed its output but kept running for {:?}, stopping it",
                    LND_COMPONENT, grace
                );
                self.supervisor.stop(grace).await
            }
        };

        self.set_component_state(LND_COMPONENT, ComponentState::Failed)
            .await;
        self.shutdown.mark_drained();

        Err(ConduitError::UnexpectedExit { outcome: outcome? })
    }
}
