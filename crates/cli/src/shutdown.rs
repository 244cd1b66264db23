use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status after a sync was cut short by SIGINT or SIGTERM.
pub const INTERRUPTED: u8 = 130;

/// Turns the first SIGINT/SIGTERM into a cancelled sync scope.
///
/// The token is what the orchestrator's context hangs off; `interrupted`
/// tells a signal-driven cancellation apart from any other.
#[derive(Clone, Default)]
pub struct Interrupts {
    scope: CancellationToken,
    interrupted: Arc<AtomicBool>,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the listener task. Must run inside the tokio runtime.
    pub fn listen(&self) {
        let interrupts = self.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            info!(signal, "Interrupted, cancelling sync");
            interrupts.interrupt();
        });
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.scope.cancel();
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(INTERRUPTED)
    }
}

async fn wait_for_signal() -> &'static str {
    let sigint = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "SIGINT listener unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM listener unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = sigint => "SIGINT",
        _ = sigterm => "SIGTERM",
    }
}
