//! AstroPulse backend server binary.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use astropulse::http::{self, AppState};
use astropulse::{
    AgentConfig, ConversationStore, DonkiClient, DonkiConfig, OpenAiChatClient, ResultAssembler,
    ServerConfig, SolarAnalystAgent,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "astropulse=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let agent_config = AgentConfig::from_env().context("agent configuration")?;
    let server_config = ServerConfig::from_env();

    let model = Arc::new(OpenAiChatClient::new(&agent_config));
    let donki = Arc::new(DonkiClient::new(DonkiConfig::from_env()));
    let registry = astropulse::tools::standard_registry(Arc::clone(&donki))
        .context("tool registration")?;
    let memory = Arc::new(ConversationStore::new(agent_config.max_memory_turns));
    let agent = Arc::new(SolarAnalystAgent::new(
        agent_config,
        model.clone(),
        registry,
        memory,
    ));
    let assembler = Arc::new(ResultAssembler::new(model.clone()));

    let origin = server_config
        .allowed_origin
        .parse::<HeaderValue>()
        .context("allowed origin is not a valid header value")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = http::router(AppState {
        agent,
        assembler,
        model,
        donki,
    })
    .layer(cors);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", server_config.bind_addr))?;
    tracing::info!("AstroPulse backend listening on {}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server crashed")?;
    Ok(())
}
