//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};

/// 提问请求（/chat 与 /ask 共用）
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: String,
}

/// /chat 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// 用户原始问题
    pub original_question: String,
    /// 翻译为规范语言后的问题
    pub translated_question: String,
    /// 翻译回用户语言的最终回答
    pub response: String,
    /// 是否命中语料
    pub matched: bool,
    /// 命中的语料问题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_prompt: Option<String>,
    /// 命中问题的相似度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// /ask 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}
