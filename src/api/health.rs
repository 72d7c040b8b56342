//! 健康检查端点

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;
use std::sync::Arc;

/// 根路由，用于确认服务存活
async fn home() -> &'static str {
    "QA chatbot server is running."
}

/// 健康检查处理器
async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "corpus_size": state.qa.corpus().len(),
        "corpus_empty": state.qa.corpus().is_empty(),
        "model": state.model,
    }))
}

/// 创建健康检查路由
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health_check))
}
