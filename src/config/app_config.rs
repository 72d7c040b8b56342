//! 应用配置管理
//!
//! 配置在启动时加载一次：可选的 `.env`，然后是 JSON 配置文件，最后由环境变量覆盖。
//! 加载后的配置由 main 显式传递给各组件，不使用全局单例。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::AppError;
use crate::services::DEFAULT_CUTOFF;
use crate::utils::DEFAULT_MAX_ENTRIES;

/// 获取配置文件路径
///
/// 优先使用 `QA_CONFIG`，否则为可执行文件同级目录下的 config.json
fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("QA_CONFIG") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API 密钥
    #[serde(default)]
    pub api_key: String,

    /// API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数
    #[serde(default)]
    pub temperature: Option<f64>,

    /// 最大输出 token 数
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 问答数据集（文件路径或 glob 模式，按顺序加载）
    #[serde(default)]
    pub datasets: Vec<String>,

    /// 最低相似度阈值
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,

    /// 匹配前问题翻译的目标语言
    #[serde(default = "default_canonical_language")]
    pub canonical_language: String,

    /// 回答翻译的目标语言
    #[serde(default = "default_reply_language")]
    pub reply_language: String,

    /// 未找到匹配时返回的回答
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,

    /// LLM 请求日志目录，未设置则不记录
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,

    /// 请求日志保留的最大条目数
    #[serde(default = "default_request_log_max_entries")]
    pub request_log_max_entries: usize,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

fn default_canonical_language() -> String {
    "en".to_string()
}

fn default_reply_language() -> String {
    "ko".to_string()
}

fn default_not_found_message() -> String {
    "No related code example was found.".to_string()
}

fn default_request_log_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
            host: default_host(),
            port: default_port(),
            datasets: Vec::new(),
            cutoff: default_cutoff(),
            canonical_language: default_canonical_language(),
            reply_language: default_reply_language(),
            not_found_message: default_not_found_message(),
            request_log_dir: None,
            request_log_max_entries: default_request_log_max_entries(),
        }
    }
}

impl AppConfig {
    /// 监听地址字符串，如 `0.0.0.0:5000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常为 `std::env::var`，测试中可替换
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(api_key) = get("GEMINI_API_KEY") {
            self.api_key = api_key;
        }
        if let Some(model) = get("QA_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = get("QA_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(host) = get("QA_HOST") {
            self.host = host;
        }
        if let Some(port) = get("QA_PORT") {
            self.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("QA_PORT 无效 ({}): {}", port, e)))?;
        }
        if let Some(datasets) = get("QA_DATASETS") {
            self.datasets = datasets
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(cutoff) = get("QA_CUTOFF") {
            self.cutoff = cutoff
                .parse()
                .map_err(|e| AppError::Config(format!("QA_CUTOFF 无效 ({}): {}", cutoff, e)))?;
        }
        if let Some(lang) = get("QA_CANONICAL_LANGUAGE") {
            self.canonical_language = lang;
        }
        if let Some(lang) = get("QA_REPLY_LANGUAGE") {
            self.reply_language = lang;
        }
        Ok(())
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            return Err(AppError::Config(format!(
                "cutoff 必须位于 [0, 1]，当前为 {}",
                self.cutoff
            )));
        }
        if self.port == 0 {
            return Err(AppError::Config("port 不能为 0".to_string()));
        }
        Ok(())
    }
}

/// 从文件加载配置
///
/// 文件不存在时返回 None；存在但无法读取或解析时报错
fn load_config_from_file(path: &Path) -> Result<Option<AppConfig>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("读取配置文件失败 {}: {}", path.display(), e)))?;
    let config = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("解析配置文件失败 {}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// 加载 env 文件到进程环境，已存在的变量不被覆盖
///
/// 优先使用 `QA_ENV_FILE` 指定的文件，否则从当前目录向上查找 `.env`。
/// 必须在初始化日志之前调用，文件中的 `RUST_LOG` 才会生效
pub fn load_dotenv() -> Option<PathBuf> {
    match std::env::var_os("QA_ENV_FILE") {
        Some(path) => load_dotenv_file(Path::new(&path)),
        None => dotenvy::dotenv().ok(),
    }
}

/// 加载指定的 env 文件
fn load_dotenv_file(path: &Path) -> Option<PathBuf> {
    dotenvy::from_path(path).ok().map(|_| path.to_path_buf())
}

/// 加载完整配置
///
/// 调用前应已通过 `load_dotenv` 加载 `.env`
pub fn load_config() -> Result<AppConfig, AppError> {
    let path = get_config_path();
    let mut config = match load_config_from_file(&path)? {
        Some(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        None => {
            info!("Config file {} not found, using defaults", path.display());
            AppConfig::default()
        }
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;

    if config.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; translation will pass text through unchanged");
    }

    Ok(config)
}
