use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bridges process signals to the runner's cancellation token. The runner
/// only observes the token between batches, so a stop request lets the
/// in-flight batch finish and commit before the run reports Aborted.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    stop_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the signal listener. First SIGINT or SIGTERM cancels the run;
    /// the flag lets the exit code distinguish an operator stop from a
    /// pipeline failure.
    pub fn register_handlers(&self) {
        let cancel_token = self.cancel_token.clone();
        let stop_flag = self.stop_requested.clone();

        tokio::spawn(async move {
            let signal = wait_for_stop_signal().await;
            info!(signal, "Stop requested, the current batch will finish and commit");

            stop_flag.store(true, Ordering::SeqCst);
            cancel_token.cancel();
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

async fn wait_for_stop_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Non-zero exit codes for an aborted run.
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    GeneralError = 1,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
