//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态。语料在启动时加载后只读，无需加锁。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmClient;
use crate::services::{Corpus, QaService, QaSettings};

/// 应用共享状态
pub struct AppState {
    /// 问答服务
    pub qa: QaService<LlmClient>,
    /// 当前模型名称
    pub model: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: &AppConfig, client: LlmClient, corpus: Corpus) -> Self {
        let model = client.model().to_string();
        Self {
            qa: QaService::new(client, corpus, QaSettings::from(config)),
            model,
        }
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: &AppConfig, client: LlmClient, corpus: Corpus) -> Arc<AppState> {
    Arc::new(AppState::new(config, client, corpus))
}
