// 连接处理模块
// 处理单个 TCP 连接的接受和服务

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::PerformanceConfig;
use crate::handler::{self, DispatchState};
use crate::logger;

/// Accept a connection and serve it on its own task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address, recorded in the access log
/// * `state` - Dispatch state of the listener
/// * `performance` - Keep-alive and timeout settings
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<DispatchState>,
    performance: PerformanceConfig,
) {
    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), performance);
}

/// Serve one connection in a spawned task.
///
/// `connection_timeout` bounds how long the connection may wait for the
/// headers of its next request, so an idle keep-alive socket is closed while a
/// busy one lives on. 0 disables the limit.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<DispatchState>,
    performance: PerformanceConfig,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive);
        if performance.connection_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(performance.connection_timeout));
        }

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&state), Some(peer_addr))
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_info(&format!("Idle connection from {peer_addr} closed"));
            } else {
                logger::log_connection_error(&err);
            }
        }
    });
}
