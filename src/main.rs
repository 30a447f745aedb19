use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

use config::{Config, ListenerKind};
use error::ServerError;
use handler::DispatchState;

fn main() -> Result<(), ServerError> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging)?;

    // 第一个参数为 "7070" 时启动 CORS 监听器
    let kind = ListenerKind::from_args(std::env::args().skip(1));

    // 创建 Tokio 运行时，根据 workers 配置设置线程数
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

    runtime.block_on(async_main(cfg, kind))
}

async fn async_main(cfg: Config, kind: ListenerKind) -> Result<(), ServerError> {
    let addr = cfg.socket_addr(kind)?;
    let listener = server::create_reusable_listener(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;

    let state = Arc::new(DispatchState::for_listener(kind, &cfg));
    logger::log_server_start(&addr, kind, &cfg);

    server::run(listener, state, cfg.performance).await;
    Ok(())
}
