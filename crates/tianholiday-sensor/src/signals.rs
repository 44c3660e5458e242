//! Unix signal handling for the long-running sensor.
//!
//! - SIGTERM/SIGINT: shutdown
//! - SIGHUP: manual refresh

use std::sync::Arc;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{SensorError, SensorResult};

/// Routes process signals to shutdown and refresh requests.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    refresh: Arc<Notify>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a new signal handler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            refresh: Arc::new(Notify::new()),
        }
    }

    /// Installs the signal handlers and spawns the listener task.
    ///
    /// # Errors
    ///
    /// Fails if a handler cannot be installed.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> SensorResult<JoinHandle<()>> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(SensorError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(SensorError::Signal)?;
        let mut sighup = signal(SignalKind::hangup()).map_err(SensorError::Signal)?;

        let shutdown_tx = self.shutdown_tx.clone();
        let refresh = self.refresh.clone();

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("received SIGTERM, shutting down");
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                    _ = sigint.recv() => {
                        info!("received SIGINT, shutting down");
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                    _ = sighup.recv() => {
                        info!("received SIGHUP, requesting refresh");
                        refresh.notify_one();
                    }
                }
            }
            debug!("signal listener stopped");
        }))
    }

    /// Ctrl+C only on non-Unix platforms.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> SensorResult<JoinHandle<()>> {
        let shutdown_tx = self.shutdown_tx.clone();
        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(true);
            }
        }))
    }

    /// Returns a future that completes when shutdown is signaled.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Returns the refresh request signal.
    pub fn refresh(&self) -> RefreshSignal {
        RefreshSignal {
            notify: self.refresh.clone(),
        }
    }

    /// Returns true if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Programmatically triggers a shutdown.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Programmatically requests a refresh.
    pub fn trigger_refresh(&self) {
        self.refresh.notify_one();
    }
}

/// Completes when shutdown is signaled.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    pub async fn wait(mut self) {
        // A closed channel also means nobody can signal any more.
        let _ = self.rx.wait_for(|shutdown| *shutdown).await;
    }
}

/// Refresh requests; a request made while nobody waits is kept for the next
/// [`wait`](RefreshSignal::wait).
#[derive(Clone)]
pub struct RefreshSignal {
    notify: Arc<Notify>,
}

impl RefreshSignal {
    /// Waits for the next refresh request.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}
