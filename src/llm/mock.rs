//! Mock 补全后端（无需 API Key）
//!
//! 默认回显最后一条 User 消息；测试中可预置脚本化回复（含失败），
//! 并注入延迟以验证 Gateway 的超时路径。所有收到的请求会被记录，
//! 便于断言 prompt 的拼装方式。

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::CompletionBackend;
use crate::models::{Message, Role};

/// Mock 后端：脚本化回复 + 请求记录
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一组按序弹出的回复；耗尽后回落到回显行为
    pub fn with_replies(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// 每次 complete 前先 sleep，用于触发上层超时
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: Result<String, String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// 收到过的所有请求（消息组快照）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.requests.lock().unwrap().push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("Echo from Mock: {}", last_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_then_echo() {
        let mock = MockBackend::with_replies(vec![Ok("first".to_string())]);

        let messages = vec![Message::user("hello")];
        assert_eq!(mock.complete(&messages).await.unwrap(), "first");
        assert!(mock
            .complete(&messages)
            .await
            .unwrap()
            .contains("hello"));
        assert_eq!(mock.requests().len(), 2);
    }
}
