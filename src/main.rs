//! Code QA Bridge - Rust Backend
//!
//! 使用 axum 框架构建的问答服务：问题经 Gemini 翻译后在问答语料中查找最相似的问题，
//! 并把回答翻译回用户语言；另提供直接调用模型的问答端点。

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod llm;
mod models;
mod services;
mod state;
mod utils;

use api::create_api_routes;
use config::{load_config, load_dotenv};
use llm::LlmClient;
use services::Corpus;
use state::create_shared_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 先于日志加载，其中的 RUST_LOG 才会生效
    let env_file = load_dotenv();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qa_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Code QA Bridge backend...");
    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }

    let config = load_config()?;

    // 语料只在启动时加载一次
    let corpus = Corpus::load(&config.datasets);
    if corpus.is_empty() {
        warn!("Corpus is empty; every /chat question will get the not-found answer");
    }
    let client = LlmClient::from_config(&config).context("failed to build Gemini client")?;

    // 创建共享状态
    let state = create_shared_state(&config, client, corpus);

    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 构建路由
    let app = Router::new()
        .merge(create_api_routes(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// 等待 Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
