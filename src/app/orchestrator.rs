use super::types::{ComponentState, OrchestratorState};
use crate::config::LndConfig;
use crate::lnd_log::{LogSink, LogTranslator, TracingSink};
use crate::shutdown::ShutdownSignal;
use crate::supervisor::ProcessSupervisor;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Drives one supervised run of the lnd daemon
///
/// `Starting` locates and launches the child (or answers a version query),
/// `Supervising` forwards its log output until the shared [`ShutdownSignal`]
/// fires, and `ShuttingDown` stops the child once the drain loop has
/// returned. An orchestrator runs at most once.
pub struct Orchestrator {
    pub(super) settings: LndConfig,
    pub(super) supervisor: ProcessSupervisor,
    pub(super) shutdown: ShutdownSignal,
    pub(super) translator: LogTranslator,
    pub(super) sink: Arc<dyn LogSink>,
    pub(super) echo: Box<dyn Write + Send + Sync>,

    // Lifecycle management
    pub(super) state: OrchestratorState,
    pub(super) ran: bool,
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
}

impl Orchestrator {
    /// Create an orchestrator that launches `settings.binary` from `PATH`
    pub fn new(settings: LndConfig, shutdown: ShutdownSignal) -> Self {
        let supervisor = ProcessSupervisor::new(settings.binary.clone());
        Self::with_supervisor(settings, supervisor, shutdown)
    }

    /// Create an orchestrator around an already configured supervisor
    pub fn with_supervisor(
        settings: LndConfig,
        supervisor: ProcessSupervisor,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            settings,
            supervisor,
            shutdown,
            translator: LogTranslator::new(),
            sink: Arc::new(TracingSink),
            echo: Box::new(std::io::stdout()),
            state: OrchestratorState::Starting,
            ran: false,
            component_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Send translated records somewhere other than the tracing subscriber
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Write the version query's answer somewhere other than stdout
    pub fn with_echo(mut self, echo: Box<dyn Write + Send + Sync>) -> Self {
        self.echo = echo;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }
}
