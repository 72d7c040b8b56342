//! LLM 请求日志记录器
//!
//! 记录所有 generateContent 请求到 JSONL 文件，便于调试和分析。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

const LOG_FILE_NAME: &str = "llm_requests.jsonl";
/// 默认保留的最大条目数
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID
    pub request_id: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL
    pub endpoint: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    /// 模型名称
    pub model: String,
    /// 提示词预览
    pub prompt_preview: String,
    /// 状态
    pub status: String,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 响应长度（字符数）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    /// 响应预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 已打开的日志文件及其当前行数
#[derive(Debug)]
struct OpenLog {
    file: File,
    lines: usize,
}

/// 请求日志记录器
///
/// 行数在内存中计数，超过上限一定余量后才重写文件，只保留最新的 `max_entries` 条
#[derive(Debug)]
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    log: Mutex<Option<OpenLog>>,
}

impl RequestLogger {
    /// 创建新的日志记录器，日志写入 `log_dir/llm_requests.jsonl`
    pub fn new(log_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(log_dir) {
            warn!("Failed to create request log dir {}: {}", log_dir.display(), e);
        }

        Self {
            log_path: log_dir.join(LOG_FILE_NAME),
            max_entries: DEFAULT_MAX_ENTRIES,
            log: Mutex::new(None),
        }
    }

    /// 设置保留的最大条目数
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// 触发清理前允许超出上限的条目数
    fn rotation_slack(&self) -> usize {
        (self.max_entries / 10).max(1)
    }

    /// 日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 按字符截断字符串
    fn truncate(s: &str, max_chars: usize) -> String {
        match s.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &s[..idx]),
            None => s.to_string(),
        }
    }

    /// 记录请求开始
    pub fn log_request(&self, endpoint: &str, model: &str, prompt: &str, api_key: &str) -> LogEntry {
        LogEntry {
            request_id: Self::generate_request_id(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            api_key_masked: Self::mask_api_key(api_key),
            model: model.to_string(),
            prompt_preview: Self::truncate(prompt, 200),
            status: "pending".to_string(),
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(&self, mut entry: LogEntry, start_time: Instant, response: &str) {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.chars().count());
        entry.response_preview = Some(Self::truncate(response, 300));
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        error_message: &str,
        status_code: Option<u16>,
    ) {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_message = Some(Self::truncate(error_message, 500));
        entry.status_code = status_code;
        self.write_entry(&entry);
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let Ok(json) = serde_json::to_string(entry) else {
            return;
        };

        let mut log_guard = self.log.lock();

        // 懒加载文件，首次打开时统计已有行数
        if log_guard.is_none() {
            match self.open_log() {
                Ok(log) => *log_guard = Some(log),
                Err(e) => {
                    warn!("Failed to open request log {}: {}", self.log_path.display(), e);
                    return;
                }
            }
        }

        let Some(log) = log_guard.as_mut() else {
            return;
        };
        if writeln!(log.file, "{}", json).is_err() {
            return;
        }
        let _ = log.file.flush();
        log.lines += 1;

        if log.lines > self.max_entries + self.rotation_slack() {
            if let Err(e) = self.rotate() {
                warn!("Failed to rotate request log {}: {}", self.log_path.display(), e);
            }
            // 重写后丢弃旧句柄，下次写入时重新打开并计数
            *log_guard = None;
        }
    }

    fn open_log(&self) -> std::io::Result<OpenLog> {
        let lines = match File::open(&self.log_path) {
            Ok(existing) => BufReader::new(existing).lines().count(),
            Err(_) => 0,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        Ok(OpenLog { file, lines })
    }

    /// 只保留最新的 max_entries 行
    fn rotate(&self) -> std::io::Result<()> {
        let lines: Vec<String> = BufReader::new(File::open(&self.log_path)?)
            .lines()
            .collect::<Result<_, _>>()?;
        let keep_from = lines.len().saturating_sub(self.max_entries);

        let mut file = File::create(&self.log_path)?;
        for line in &lines[keep_from..] {
            writeln!(file, "{}", line)?;
        }
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(RequestLogger::mask_api_key("short"), "*****");
        assert_eq!(RequestLogger::mask_api_key("AIzaSyABCDEFGH1234"), "AIza...1234");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(RequestLogger::truncate("안녕하세요", 2), "안녕...");
        assert_eq!(RequestLogger::truncate("abc", 5), "abc");
    }

    #[test]
    fn test_logs_success_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RequestLogger::new(dir.path());

        let entry = logger.log_request("http://x", "gemini-1.5-flash", "Translate this", "AIzaSyABCDEFGH1234");
        logger.log_success(entry, Instant::now(), "번역 결과");

        let entry = logger.log_request("http://x", "gemini-1.5-flash", "Another", "key");
        logger.log_error(entry, Instant::now(), "API 错误 (500): boom", Some(500));

        let entries = read_entries(logger.log_path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, "success");
        assert_eq!(entries[0].response_length, Some(5));
        assert_eq!(entries[0].api_key_masked, "AIza...1234");
        assert_eq!(entries[1].status, "error");
        assert_eq!(entries[1].status_code, Some(500));
    }

    #[test]
    fn test_keeps_only_latest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RequestLogger::new(dir.path()).with_max_entries(2);

        for i in 0..4 {
            let entry = logger.log_request("http://x", "m", &format!("prompt {}", i), "k");
            logger.log_success(entry, Instant::now(), "ok");
        }

        let entries = read_entries(logger.log_path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].prompt_preview, "prompt 2");
        assert_eq!(entries[1].prompt_preview, "prompt 3");
    }

    #[test]
    fn test_no_rewrite_within_slack() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RequestLogger::new(dir.path()).with_max_entries(10);

        // 上限 10，余量 1：第 11 条不触发重写
        for i in 0..11 {
            let entry = logger.log_request("http://x", "m", &format!("prompt {}", i), "k");
            logger.log_success(entry, Instant::now(), "ok");
        }
        assert_eq!(read_entries(logger.log_path()).len(), 11);

        let entry = logger.log_request("http://x", "m", "prompt 11", "k");
        logger.log_success(entry, Instant::now(), "ok");
        let entries = read_entries(logger.log_path());
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].prompt_preview, "prompt 2");
        assert_eq!(entries[9].prompt_preview, "prompt 11");
    }

    #[test]
    fn test_counts_existing_lines_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let first = RequestLogger::new(dir.path());
        for i in 0..3 {
            let entry = first.log_request("http://x", "m", &format!("old {}", i), "k");
            first.log_success(entry, Instant::now(), "ok");
        }
        drop(first);

        let logger = RequestLogger::new(dir.path()).with_max_entries(2);
        let entry = logger.log_request("http://x", "m", "new", "k");
        logger.log_success(entry, Instant::now(), "ok");

        let entries = read_entries(logger.log_path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].prompt_preview, "old 2");
        assert_eq!(entries[1].prompt_preview, "new");
    }
}
