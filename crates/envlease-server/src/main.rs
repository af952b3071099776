//! Binary entrypoint for the envlease HTTP server.
//!
//! Configuration is read from `ENVLEASE_*` environment variables; see
//! [`envlease_server::config`].

use std::process;

use envlease_server::config::ServerConfig;
use envlease_server::router::build_router;
use envlease_server::state::AppState;

#[tokio::main]
async fn main() {
    envlease_server::init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to initialize application state: {}", e);
            process::exit(3);
        }
    };

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(db = %config.db_path, admins = config.admins.len(), "envlease server starting on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", addr, e);
            process::exit(3);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        process::exit(1);
    }
}
