use super::types::LND_COMPONENT;
use super::{ComponentState, Orchestrator};
use crate::error::Result;
use crate::supervisor::{LineStream, VersionRequested};
use tokio::process::ChildStdout;
use tracing::info;

/// What the `Starting` phase produced
pub(super) enum Launched {
    Version(VersionRequested),
    Supervising(LineStream<ChildStdout>),
}

impl Orchestrator {
    /// Locate the binary, then either answer the version query or start the
    /// long-running child.
    pub(super) async fn start_child(&mut self) -> Result<Launched> {
        info!("Starting {} component", LND_COMPONENT);
        self.set_component_state(LND_COMPONENT, ComponentState::Starting)
            .await;

        if let Err(e) = self.supervisor.locate() {
            self.set_component_state(LND_COMPONENT, ComponentState::Failed)
                .await;
            return Err(e);
        }

        if self.settings.show_version {
            let result = self
                .supervisor
                .run_version_query(&self.settings.version_args, &mut *self.echo)
                .await;
            let state = if result.is_ok() {
                ComponentState::Stopped
            } else {
                ComponentState::Failed
            };
            self.set_component_state(LND_COMPONENT, state).await;
            return result.map(Launched::Version);
        }

        let args = self.settings.command_args();
        match self.supervisor.start(&args) {
            Ok(lines) => {
                self.set_component_state(LND_COMPONENT, ComponentState::Running)
                    .await;
                info!("{} component started", LND_COMPONENT);
                Ok(Launched::Supervising(lines))
            }
            Err(e) => {
                self.set_component_state(LND_COMPONENT, ComponentState::Failed)
                    .await;
                Err(e)
            }
        }
    }
}
