//! 聊天处理器
//!
//! 取最近 5 轮历史拼上下文，调一次补全，原样作为回复。
//! 从不触碰生成管线，也不产生制品。

use std::sync::Arc;
use std::time::Duration;

use crate::core::TurnState;
use crate::generation::prompts;
use crate::handlers::degraded_reply;
use crate::llm::CompletionGateway;
use crate::models::Message;

/// 随消息送入 prompt 的历史轮数
const CHAT_CONTEXT_TURNS: usize = 5;

pub struct ChatHandler {
    gateway: Arc<CompletionGateway>,
    timeout: Duration,
}

impl ChatHandler {
    pub fn new(gateway: Arc<CompletionGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub async fn handle(&self, state: TurnState) -> TurnState {
        let start = state.history.len().saturating_sub(CHAT_CONTEXT_TURNS);
        let context: String = state.history[start..]
            .iter()
            .map(|t| format!("{}: {}\n", t.sender, t.content))
            .collect();

        let messages = vec![
            Message::system(prompts::chat_prompt(&context)),
            Message::user(state.message.clone()),
        ];

        match self.gateway.complete(&messages, self.timeout).await {
            Ok(reply) => state.with_response(reply).with_tool("chat_completion"),
            Err(e) => {
                tracing::error!("Chat completion failed: {}", e);
                let reply = degraded_reply(&e);
                state.with_error_reply(reply)
            }
        }
    }
}
