// Server loop module
// Accepts connections until a shutdown signal arrives

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::shutdown_signal;
use crate::config::PerformanceConfig;
use crate::handler::DispatchState;
use crate::logger;

/// Run the accept loop until SIGTERM or Ctrl+C
pub async fn run(listener: TcpListener, state: Arc<DispatchState>, performance: PerformanceConfig) {
    serve_until(listener, state, performance, shutdown_signal()).await;
}

/// Run the accept loop until `shutdown` resolves
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve_until<F>(
    listener: TcpListener,
    state: Arc<DispatchState>,
    performance: PerformanceConfig,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, performance);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                match listener.local_addr() {
                    Ok(addr) => logger::log_shutdown(&addr),
                    Err(_) => logger::log_info("Shutdown requested"),
                }
                return;
            }
        }
    }
}
