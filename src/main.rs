//! codesearch HTTP server entrypoint.

use std::net::SocketAddr;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use codesearch::config::Config;
use codesearch::embedding::{Encoder, SinterConfig};
use codesearch::llm::{GenaiClient, LlmGateway};
use codesearch::vectordb::{QdrantClient, VectorDbClient};
use codesearch::{AppState, router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(addr = %addr, collection = %config.vector_index_name, "codesearch starting");

    let sinter_config = if let Some(path) = &config.embedding_model_path {
        SinterConfig::new(path.clone())
    } else {
        tracing::warn!("no EMBEDDING_MODEL_PATH configured, running encoder in stub mode");
        SinterConfig::stub()
    };
    let encoder = Encoder::load(sinter_config)?;

    let gateway = if config.llm_configured() {
        if let Some(key) = &config.llm_key {
            // genai's Client discovers provider keys from their usual env vars.
            std::env::set_var("OPENAI_API_KEY", key);
        }
        Some(LlmGateway::new(
            GenaiClient::new(),
            "gpt-4o-mini",
            config.llm_max_concurrency,
            config.llm_retries,
            config.llm_rate_limit_sleep,
        ))
    } else {
        tracing::warn!("no LLM_KEY configured, running with LLM stages disabled");
        None
    };

    let store = QdrantClient::new(&config.qdrant_url).await?;
    store
        .ensure_collection(&config.vector_index_name, encoder.embedding_dim() as u64)
        .await?;

    let state = AppState::new(encoder, gateway, store, config);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("codesearch shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}
