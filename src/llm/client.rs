//! Gemini generateContent 客户端

use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::format::build_gemini_endpoint;
use super::types::{
    ApiErrorBody, GenerateContentRequest, GenerateContentResponse, GenerationConfig, LlmError,
};
use crate::config::AppConfig;
use crate::utils::RequestLogger;

/// 文本生成能力
///
/// 翻译与直接问答都只依赖该 trait；生产中由 `LlmClient` 实现，测试中替换为假实现。
pub trait Generator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Gemini 客户端
///
/// 显式构造并注入到需要它的组件中
#[derive(Clone, Debug)]
pub struct LlmClient {
    client: Client,
    api_key: ApiKey,
    endpoint: String,
    model: String,
    generation_config: Option<GenerationConfig>,
    request_logger: Option<Arc<RequestLogger>>,
}

impl LlmClient {
    /// 创建新的 Gemini 客户端
    ///
    /// 允许空密钥：此时每次调用都会返回 `LlmError::ConfigError`
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key: String = api_key.into();
        let model = model.into();

        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key: ApiKey(api_key.trim().to_string()),
            endpoint: build_gemini_endpoint(base_url, &model),
            model,
            generation_config: None,
            request_logger: None,
        })
    }

    /// 根据应用配置创建客户端
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let client = Self::new(
            config.api_key.clone(),
            &config.base_url,
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_generation_config(GenerationConfig::from_options(
            config.temperature,
            config.max_tokens,
        ));

        let client = match &config.request_log_dir {
            Some(dir) => {
                let logger =
                    RequestLogger::new(dir).with_max_entries(config.request_log_max_entries);
                client.with_request_logger(Arc::new(logger))
            }
            None => client,
        };

        info!("LLM client ready: model={}, endpoint={}", client.model, client.endpoint);
        Ok(client)
    }

    pub fn with_generation_config(mut self, generation_config: Option<GenerationConfig>) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn with_request_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.request_logger = Some(logger);
        self
    }

    /// 模型名称
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 发送单次 generateContent 请求
    async fn generate_content(&self, prompt: &str) -> Result<String, LlmError> {
        if self.api_key.0.is_empty() {
            return Err(LlmError::ConfigError(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }

        let payload = GenerateContentRequest::user(prompt, self.generation_config.clone());

        debug!("Gemini API request: endpoint={}, model={}", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key.0)
            .json(&payload)
            .send()
            .await?;

        // 检查状态码
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited");
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<GenerateContentResponse>(&error_text) {
                if let Some(err) = &body.error {
                    let classified = classify_api_error(err, status.as_u16());
                    warn!("Gemini API error: {}", classified);
                    return Err(classified);
                }
            }
            let snippet: String = error_text.chars().take(200).collect();
            warn!("Gemini API error: status={}, body={}", status, snippet);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: format!("HTTP {}: {}", status, snippet),
            });
        }

        let text = response.text().await?;
        let body: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            let snippet: String = text.chars().take(200).collect();
            warn!("Gemini API returned malformed JSON: {}, body={}", e, snippet);
            LlmError::JsonError(e)
        })?;

        if let Some(err) = &body.error {
            let classified = classify_api_error(err, status.as_u16());
            warn!("Gemini API error in 200 response: {}", classified);
            return Err(classified);
        }

        body.text().ok_or(LlmError::EmptyResponse)
    }
}

impl Generator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let Some(logger) = &self.request_logger else {
            return self.generate_content(prompt).await;
        };

        let start = Instant::now();
        let entry = logger.log_request(&self.endpoint, &self.model, prompt, &self.api_key.0);
        let result = self.generate_content(prompt).await;
        match &result {
            Ok(text) => logger.log_success(entry, start, text),
            Err(e) => logger.log_error(entry, start, &e.to_string(), e.status_code()),
        }
        result
    }
}

/// 将结构化错误体归类为 LlmError
fn classify_api_error(err: &ApiErrorBody, http_status: u16) -> LlmError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code.unwrap_or(http_status) {
        429 => LlmError::RateLimited,
        status => LlmError::ApiError { status, message },
    }
}
