use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http;
use shared::agent_directory::LangGraphDirectory;
use shared::config::ApiConfig;
use shared::config_env::load_dotenv;
use tokio::signal;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let dotenv_path = load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=debug,shared=info,axum=info".to_string()),
        )
        .init();

    if let Some(path) = dotenv_path {
        debug!(path = %path.display(), "loaded environment overrides");
    }

    let config = match ApiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let directory = match LangGraphDirectory::new(&config.agent_directory) {
        Ok(directory) => directory,
        Err(err) => {
            error!("failed to build agent directory client: {err}");
            std::process::exit(1);
        }
    };

    let app = http::build_router(http::AppState {
        directory: Arc::new(directory),
        conversation_list_limit: config.conversation_list_limit,
    });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid bind address {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "api server listening on {} (agent directory {})",
        listener.local_addr().unwrap_or(addr),
        config.agent_directory.api_url
    );

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {err}");
            return;
        }
        info!("shutdown signal received");
    });

    if let Err(err) = server.await {
        error!("server exited with error: {err}");
        std::process::exit(1);
    }
}
