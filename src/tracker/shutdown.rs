use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process and turns them into a cancellation of the tracker. Returns
/// without doing anything once the token is cancelled by someone else.
///
/// On Windows detached processes can't detect signals sent to them, so `stop` there falls back
/// to terminating the process.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = interrupt() => {
            info!("Received interrupt");
        },
        _ = terminate() => {
            info!("Received termination signal");
        },
        _ = cancelation.cancelled() => return,
    };
    cancelation.cancel();
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupts {e:?}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to listen for SIGTERM {e:?}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
