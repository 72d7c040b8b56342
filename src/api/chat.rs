//! 问答端点

use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::error::AppResult;
use crate::models::{AskResponse, ChatResponse, QuestionRequest};
use crate::state::AppState;

/// 语料匹配问答
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuestionRequest>,
) -> AppResult<Json<ChatResponse>> {
    info!("Chat question received: {} chars", req.question.chars().count());
    let response = state.qa.answer(&req.question).await?;
    Ok(Json(response))
}

/// 直接向模型提问
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuestionRequest>,
) -> AppResult<Json<AskResponse>> {
    info!("Ask question received: {} chars", req.question.chars().count());
    let response = state.qa.ask(&req.question).await?;
    Ok(Json(response))
}

/// 创建问答路由
pub fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/ask", post(ask))
}
