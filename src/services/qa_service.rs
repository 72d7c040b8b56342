//! 问答服务
//!
//! `/chat`：问题翻译为规范语言 → 语料最佳匹配 → 回答翻译回用户语言。
//! `/ask`：问题直接交给生成模型。

use tracing::info;

use super::corpus::Corpus;
use super::matcher::find_best_match;
use super::translator::Translator;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::llm::Generator;
use crate::models::{AskResponse, ChatResponse};

/// 匹配与翻译设置
#[derive(Debug, Clone)]
pub struct QaSettings {
    pub cutoff: f64,
    pub canonical_language: String,
    pub reply_language: String,
    pub not_found_message: String,
}

impl From<&AppConfig> for QaSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            cutoff: config.cutoff,
            canonical_language: config.canonical_language.clone(),
            reply_language: config.reply_language.clone(),
            not_found_message: config.not_found_message.clone(),
        }
    }
}

/// 问答服务
pub struct QaService<G> {
    translator: Translator<G>,
    corpus: Corpus,
    settings: QaSettings,
}

impl<G: Generator> QaService<G> {
    pub fn new(generator: G, corpus: Corpus, settings: QaSettings) -> Self {
        Self {
            translator: Translator::new(generator),
            corpus,
            settings,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// 在语料中查找问题的答案
    pub async fn answer(&self, question: &str) -> AppResult<ChatResponse> {
        let question = require_question(question)?;

        let translated_question = self
            .translator
            .translate(question, &self.settings.canonical_language)
            .await;

        let outcome = find_best_match(
            &translated_question,
            self.corpus.entries(),
            self.settings.cutoff,
        );

        let (answer, matched_prompt, similarity) = match &outcome {
            Some(m) => {
                info!("Corpus match: score={:.3}, prompt={}", m.score, m.prompt);
                (m.answer, Some(m.prompt.to_string()), Some(m.score))
            }
            None => {
                info!("No corpus match above cutoff {}", self.settings.cutoff);
                (self.settings.not_found_message.as_str(), None, None)
            }
        };

        let response = self
            .translator
            .translate(answer, &self.settings.reply_language)
            .await;

        Ok(ChatResponse {
            original_question: question.to_string(),
            translated_question,
            response,
            matched: outcome.is_some(),
            matched_prompt,
            similarity,
        })
    }

    /// 直接向生成模型提问
    pub async fn ask(&self, question: &str) -> AppResult<AskResponse> {
        let question = require_question(question)?;
        let answer = self.translator.generator().generate(question).await?;
        Ok(AskResponse { answer })
    }
}

/// 拒绝空问题，非空时原样返回
fn require_question(question: &str) -> AppResult<&str> {
    if question.is_empty() {
        return Err(AppError::BadRequest("question is required".to_string()));
    }
    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::corpus::CorpusEntry;
    use crate::services::translator::testing::FakeGenerator;

    const TO_EN: &str = "Translate the following text into en:\n";
    const TO_KO: &str = "Translate the following text into ko:\n";

    fn settings() -> QaSettings {
        QaSettings::from(&AppConfig::default())
    }

    fn corpus() -> Corpus {
        Corpus::from_entries(vec![CorpusEntry::new(
            "write a function to add two numbers",
            "def add(a,b): return a+b",
        )])
    }

    #[tokio::test]
    async fn test_answer_round_trips_through_translation() {
        let generator = FakeGenerator::default()
            .reply(&format!("{TO_EN}두 수를 더하는 코드"), "how do I add two numbers in code")
            .reply(&format!("{TO_KO}def add(a,b): return a+b"), "def add(a,b): return a+b");
        let service = QaService::new(generator, corpus(), settings());

        let response = service.answer("두 수를 더하는 코드").await.unwrap();
        assert_eq!(response.original_question, "두 수를 더하는 코드");
        assert_eq!(response.translated_question, "how do I add two numbers in code");
        assert_eq!(response.response, "def add(a,b): return a+b");
        assert!(response.matched);
        assert_eq!(
            response.matched_prompt.as_deref(),
            Some("write a function to add two numbers")
        );
        assert!(response.similarity.unwrap() >= 0.5);

        // 问题只翻译一次
        let prompts = service.translator.generator().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with(TO_EN));
        assert!(prompts[1].starts_with(TO_KO));
    }

    #[tokio::test]
    async fn test_answer_without_match_returns_not_found_message() {
        let generator = FakeGenerator::default()
            .reply(&format!("{TO_EN}프랑스의 수도는?"), "what is the capital of France")
            .reply(
                &format!("{TO_KO}No related code example was found."),
                "관련된 코드 예제를 찾을 수 없습니다.",
            );
        let service = QaService::new(generator, corpus(), settings());

        let response = service.answer("프랑스의 수도는?").await.unwrap();
        assert!(!response.matched);
        assert!(response.matched_prompt.is_none());
        assert!(response.similarity.is_none());
        assert_eq!(response.response, "관련된 코드 예제를 찾을 수 없습니다.");
    }

    #[tokio::test]
    async fn test_answer_survives_translation_failures() {
        // 所有翻译都失败：按原文匹配并原样返回回答
        let generator = FakeGenerator::default();
        let service = QaService::new(generator, corpus(), settings());

        let response = service
            .answer("write a function to add two numbers")
            .await
            .unwrap();
        assert_eq!(response.translated_question, "write a function to add two numbers");
        assert_eq!(response.response, "def add(a,b): return a+b");
        assert_eq!(response.similarity, Some(1.0));
    }

    #[tokio::test]
    async fn test_answer_with_empty_corpus() {
        let service = QaService::new(FakeGenerator::default(), Corpus::default(), settings());
        let response = service.answer("anything").await.unwrap();
        assert!(!response.matched);
        assert_eq!(response.response, "No related code example was found.");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let service = QaService::new(FakeGenerator::default(), corpus(), settings());
        assert!(matches!(service.answer("").await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.ask("").await, Err(AppError::BadRequest(_))));
        assert!(service.translator.generator().prompts().is_empty());
    }

    #[tokio::test]
    async fn test_original_question_is_echoed_verbatim() {
        let generator = FakeGenerator::default().reply(
            &format!("{TO_EN}  두 수를 더하는 코드 "),
            "how do I add two numbers in code",
        );
        let service = QaService::new(generator, corpus(), settings());

        let response = service.answer("  두 수를 더하는 코드 ").await.unwrap();
        assert_eq!(response.original_question, "  두 수를 더하는 코드 ");
        assert!(response.matched);
    }

    #[tokio::test]
    async fn test_whitespace_question_is_not_rejected() {
        let service = QaService::new(FakeGenerator::default(), corpus(), settings());

        let response = service.answer("   ").await.unwrap();
        assert_eq!(response.original_question, "   ");
        assert!(!response.matched);
        assert_eq!(response.response, "No related code example was found.");
    }

    #[tokio::test]
    async fn test_ask_passes_question_through() {
        let generator = FakeGenerator::default().reply("What is Rust?", "A systems language.");
        let service = QaService::new(generator, corpus(), settings());

        let response = service.ask("What is Rust?").await.unwrap();
        assert_eq!(response.answer, "A systems language.");
    }

    #[tokio::test]
    async fn test_ask_surfaces_generator_errors() {
        let generator = FakeGenerator::default().fail("boom?", "upstream down");
        let service = QaService::new(generator, corpus(), settings());
        assert!(matches!(service.ask("boom?").await, Err(AppError::Llm(_))));
    }
}
