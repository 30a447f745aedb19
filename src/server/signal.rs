// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use crate::logger;

/// Resolve once the process is asked to stop
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => logger::log_info("[SIGNAL] SIGTERM received, shutting down"),
        () = ctrl_c() => logger::log_info("[SIGNAL] SIGINT received (Ctrl+C), shutting down"),
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
    logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        // Without a handler the server runs until killed
        std::future::pending::<()>().await;
    }
}
