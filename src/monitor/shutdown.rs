//! Stop requests for the scheduler loop.
//!
//! The loop only looks at the [`StopSignal`] between cycles, so a run that is
//! already in flight always finishes and gets recorded before the monitor
//! exits.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Sending half: requests a graceful stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Ask the monitor to stop at the next cycle boundary.
    pub fn request_stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half, observed by the scheduler loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal that is never raised.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop is requested. Never resolves if every
    /// [`StopHandle`] is dropped without requesting one.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a connected handle/signal pair.
#[must_use]
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Request a stop on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub fn listen_for_interrupt(handle: StopHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "could not install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => info!("Received SIGINT (Ctrl+C), stopping after the current cycle"),
            () = terminate => info!("Received SIGTERM, stopping after the current cycle"),
        }

        handle.request_stop();
    })
}
