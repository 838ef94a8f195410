//! LLM 层：补全后端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）+ 超时网关

pub mod deepseek;
pub mod gateway;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_backend, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use gateway::CompletionGateway;
pub use mock::MockBackend;
pub use openai::{OpenAiBackend, TokenUsage};
pub use traits::CompletionBackend;
