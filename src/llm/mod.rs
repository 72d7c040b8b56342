//! LLM 模块
//!
//! 提供 Gemini generateContent 客户端以及供上层使用的 `Generator` 抽象。

mod client;
mod format;
mod types;

pub use client::{Generator, LlmClient};
pub use types::*;
