use std::rc::Rc;
use std::sync::Arc;

use combo_static::asset::FsLoader;
use combo_static::config::{AppState, Config};
use combo_static::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Rc::new(AppState::new(&cfg, Arc::new(FsLoader)));
    logger::log_server_start(&addr, &cfg);

    // Requests, and the member loads of combo requests, run as local tasks
    let local = tokio::task::LocalSet::new();
    local.run_until(server::serve(listener, state)).await;
    Ok(())
}
