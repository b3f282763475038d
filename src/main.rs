use std::sync::Arc;

use restpoint::api::FilesEndpoint;
use restpoint::config::{self, AppState};
use restpoint::{logger, server, ServerError};

fn main() -> Result<(), ServerError> {
    // First CLI argument overrides the config file path (without extension)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(AppState::new(&cfg));

    logger::log_server_start(&addr, &cfg);

    server::run(listener, state, Arc::new(FilesEndpoint), server::shutdown_signal()).await?;
    logger::log_info("Server stopped");
    Ok(())
}
