//! Process-wide, fire-once shutdown notification.
//!
//! Every component holds a clone of [`ShutdownSignal`]. The first request
//! (OS signal or programmatic) wins; later requests are no-ops. Waiting on
//! [`ShutdownSignal::done`] after the signal fired returns immediately, as
//! many times as anyone asks.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const IDLE: u8 = 0;
const REQUESTED: u8 = 1;
const DRAINED: u8 = 2;

/// Why shutdown was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An OS termination signal arrived
    Signal(String),
    /// A fatal condition inside conduit
    Error(String),
    /// The supervised child went away on its own
    ChildExited,
    /// Explicit request through the API
    UserRequest,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "received {}", name),
            ShutdownReason::Error(message) => write!(f, "error: {}", message),
            ShutdownReason::ChildExited => f.write_str("child process exited"),
            ShutdownReason::UserRequest => f.write_str("requested"),
        }
    }
}

/// Lifecycle of the shutdown signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Idle,
    Requested,
    Drained,
}

struct Inner {
    token: CancellationToken,
    state: AtomicU8,
    reason: Mutex<Option<ShutdownReason>>,
}

/// Cloneable handle to the shared shutdown notification
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                state: AtomicU8::new(IDLE),
                reason: Mutex::new(None),
            }),
        }
    }

    /// Request shutdown. Returns `true` only for the call that fired the signal.
    pub fn request(&self, reason: ShutdownReason) -> bool {
        let mut slot = self.inner.reason.lock();
        if self
            .inner
            .state
            .compare_exchange(IDLE, REQUESTED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Shutdown already requested, ignoring: {}", reason);
            return false;
        }

        info!("Shutdown requested: {}", reason);
        *slot = Some(reason);
        drop(slot);

        self.inner.token.cancel();
        true
    }

    /// Shorthand for [`request`](Self::request) with [`ShutdownReason::UserRequest`].
    pub fn request_shutdown(&self) -> bool {
        self.request(ShutdownReason::UserRequest)
    }

    /// Resolves once shutdown has been requested; immediately if it already was.
    pub async fn done(&self) {
        self.inner.token.cancelled().await
    }

    pub fn is_requested(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub fn state(&self) -> ShutdownState {
        match self.inner.state.load(Ordering::Acquire) {
            IDLE => ShutdownState::Idle,
            REQUESTED => ShutdownState::Requested,
            _ => ShutdownState::Drained,
        }
    }

    /// Reason given by the request that fired the signal.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.inner.reason.lock().clone()
    }

    /// Record that the drain loop has fully stopped.
    ///
    /// Only valid after a request; returns `false` otherwise.
    pub fn mark_drained(&self) -> bool {
        let drained = self
            .inner
            .state
            .compare_exchange(REQUESTED, DRAINED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if drained {
            debug!("Shutdown drained");
        }
        drained
    }

    /// Spawn tasks that turn SIGINT (and SIGTERM on Unix) into a request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install_os_handlers(&self) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let shutdown = self.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    received = sigterm.recv() => {
                        if received.is_some() {
                            info!("Received SIGTERM signal");
                            shutdown.request(ShutdownReason::Signal("SIGTERM".to_string()));
                        }
                    }
                    _ = shutdown.done() => {}
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("Received SIGINT signal (Ctrl+C)");
                        shutdown.request(ShutdownReason::Signal("SIGINT".to_string()));
                    }
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                },
                _ = shutdown.done() => {}
            }
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("state", &self.state())
            .field("reason", &self.reason())
            .finish()
    }
}
