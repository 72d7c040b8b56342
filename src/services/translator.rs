//! 基于生成模型的翻译
//!
//! 翻译失败不是致命错误：任何错误或空输出都原样返回输入文本。

use tracing::{debug, warn};

use crate::llm::Generator;

/// 翻译器
pub struct Translator<G> {
    generator: G,
}

impl<G: Generator> Translator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// 底层生成器
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// 将 text 翻译为 target_language，失败时返回原文
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let prompt = build_translation_prompt(text, target_language);
        match self.generator.generate(&prompt).await {
            Ok(translated) => {
                let translated = translated.trim();
                if translated.is_empty() {
                    warn!("Empty translation to {}, keeping original text", target_language);
                    text.to_string()
                } else {
                    debug!("Translated to {}: {} chars", target_language, translated.chars().count());
                    translated.to_string()
                }
            }
            Err(e) => {
                warn!("Translation to {} failed, keeping original text: {}", target_language, e);
                text.to_string()
            }
        }
    }
}

/// 翻译提示词
fn build_translation_prompt(text: &str, target_language: &str) -> String {
    format!("Translate the following text into {}:\n{}", target_language, text)
}
