pub mod app;
pub mod config;
pub mod error;
pub mod lnd_log;
pub mod logging;
pub mod shutdown;
pub mod supervisor;
pub mod utils;

pub use app::{ComponentState, DrainEnd, DrainReport, Orchestrator, OrchestratorState, RunOutcome};
pub use config::{ConduitConfig, LndConfig};
pub use error::{ConduitError, Result};
pub use lnd_log::{LogRecord, LogSink, LogTranslator, MemorySink, Severity, TracingSink};
pub use logging::{init_logging, LogFormat};
pub use shutdown::{ShutdownReason, ShutdownSignal, ShutdownState};
pub use supervisor::{ExitOutcome, LineStream, ProcessSupervisor, VersionRequested};
