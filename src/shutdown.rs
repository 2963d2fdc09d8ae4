//! Graceful Shutdown Module
//!
//! SIGINT/SIGTERM stop the listener; in-flight calls and streams get a
//! bounded drain period before the process exits.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Fires the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Creates a connected trigger/signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, ShutdownSignal { receiver })
}

impl ShutdownTrigger {
    /// Requests shutdown. Idempotent.
    pub fn fire(&self) {
        self.sender.send_replace(true);
    }
}

impl ShutdownSignal {
    /// Waits for shutdown signal
    pub async fn recv(mut self) {
        // A dropped trigger also counts as shutdown.
        let _ = self.receiver.wait_for(|fired| *fired).await;
    }

    /// Checks if shutdown has been signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs a server future, bounding how long it may drain after shutdown.
///
/// `server` is expected to stop accepting connections when `shutdown` fires
/// (tonic's `serve_with_shutdown`). Once it has fired, the server gets
/// `drain_timeout` to finish; after that it is dropped.
pub async fn run_with_graceful_shutdown<F, E>(
    server: F,
    shutdown: ShutdownSignal,
    drain_timeout: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            match &result {
                Ok(()) => info!("Server stopped normally"),
                Err(e) => error!(error = %e, "Server error"),
            }
            return result;
        }
        _ = shutdown.recv() => {
            info!(drain_timeout_secs = drain_timeout.as_secs(), "Shutdown signal received, draining");
        }
    }

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => {
            info!("Shutdown complete");
            result
        }
        Err(_) => {
            warn!("Shutdown timeout reached, dropping remaining streams");
            Ok(())
        }
    }
}
