//! Two-stage handling of SIGINT and SIGTERM.
//!
//! The first signal asks the reconcile loop to stop and clean up. A second
//! signal exits the process immediately, whatever the loop is doing.
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::oneshot;

/// Exit code used when a second signal forces the process to exit.
pub const FORCED_EXIT_CODE: i32 = 1;

/// Installs the signal handlers and returns the receiver that fires on the
/// first signal.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be registered.
pub fn install_signal_handler() -> std::io::Result<oneshot::Receiver<()>> {
    let sigint = signal(SignalKind::interrupt())?;
    let sigterm = signal(SignalKind::terminate())?;
    let (stop_tx, stop_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut signals = Signals { sigint, sigterm };
        signals.recv().await;
        log::info!("received shutdown signal, stopping gracefully");
        if stop_tx.send(()).is_err() {
            log::debug!("reconcile loop already stopped");
        }

        signals.recv().await;
        log::warn!("received second shutdown signal, exiting immediately");
        std::process::exit(FORCED_EXIT_CODE);
    });

    Ok(stop_rx)
}

struct Signals {
    sigint: Signal,
    sigterm: Signal,
}

impl Signals {
    async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv() => log::debug!("received SIGINT"),
            _ = self.sigterm.recv() => log::debug!("received SIGTERM"),
        }
    }
}
