//! 服务层模块

mod corpus;
mod matcher;
mod qa_service;
mod translator;

pub use corpus::{Corpus, CorpusEntry};
pub use matcher::DEFAULT_CUTOFF;
pub use qa_service::{QaService, QaSettings};
