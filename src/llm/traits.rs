//! 补全后端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 CompletionBackend：
//! 单次非流式补全，返回原始文本。超时与错误归类在 CompletionGateway 一层做。

use async_trait::async_trait;

use crate::models::Message;

/// 补全后端 trait：发送一组消息，拿回模型的原始回复文本
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
