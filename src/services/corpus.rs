//! 问答语料加载
//!
//! 数据集为 `{instruction, response}` 记录组成的 JSON 数组。
//! 任何加载失败都降级为空序列，不会中断启动。

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 语料条目
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorpusEntry {
    /// 问题文本
    #[serde(rename = "instruction")]
    pub prompt: String,
    /// 对应回答
    #[serde(rename = "response")]
    pub answer: String,
}

impl CorpusEntry {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }
}

/// 启动时构建的只读语料
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// 按配置顺序加载并拼接所有数据集
    pub fn load(patterns: &[String]) -> Self {
        let mut entries = Vec::new();
        for path in resolve_dataset_paths(patterns) {
            entries.extend(load_dataset(&path));
        }
        info!("Corpus loaded: {} entries", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 展开数据集路径
///
/// glob 匹配结果按路径排序；无匹配的模式按字面路径保留，以便后续输出缺失警告
pub fn resolve_dataset_paths(patterns: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let mut matched: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(iter) => iter.filter_map(Result::ok).collect(),
            Err(e) => {
                warn!("Invalid dataset pattern {}: {}", pattern, e);
                Vec::new()
            }
        };

        if matched.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            matched.sort();
            paths.append(&mut matched);
        }
    }
    paths
}

/// 加载单个数据集文件
pub fn load_dataset(path: &Path) -> Vec<CorpusEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Dataset not readable {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CorpusEntry>>(&content) {
        Ok(entries) => {
            info!("Loaded {} entries from {}", entries.len(), path.display());
            entries
        }
        Err(e) => {
            warn!("Malformed dataset {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
