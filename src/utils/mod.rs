//! 工具模块

mod request_logger;

pub use request_logger::{RequestLogger, DEFAULT_MAX_ENTRIES};
