//! Completion Gateway：补全调用的唯一出口
//!
//! 包装任意 CompletionBackend，按调用方给定的超时执行一次补全，
//! 并把超时 / 传输失败归类为 AgentError。不在此层重试。

use std::sync::Arc;
use std::time::Duration;

use crate::core::AgentError;
use crate::llm::CompletionBackend;
use crate::models::Message;

/// 补全网关：无状态，单次调用 = 单次后端请求
pub struct CompletionGateway {
    backend: Arc<dyn CompletionBackend>,
}

impl CompletionGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// 获取后端累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.backend.token_usage()
    }

    /// 发送一组消息并等待原始回复文本，超过 timeout 即放弃等待
    ///
    /// 没有取消传播：超时后底层请求可能仍在进行，这里只是不再等它。
    pub async fn complete(
        &self,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<String, AgentError> {
        match tokio::time::timeout(timeout, self.backend.complete(messages)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!("Completion backend failed: {}", e);
                Err(AgentError::UpstreamUnavailable(e))
            }
            Err(_) => {
                tracing::warn!("Completion call exceeded {}s budget", timeout.as_secs());
                Err(AgentError::UpstreamTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockBackend;

    #[tokio::test]
    async fn test_complete_passes_text_through() {
        let gateway = CompletionGateway::new(Arc::new(MockBackend::with_replies(vec![Ok(
            "raw reply".to_string(),
        )])));

        let reply = gateway
            .complete(&[Message::user("hi")], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply, "raw reply");
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_unavailable() {
        let gateway = CompletionGateway::new(Arc::new(MockBackend::with_replies(vec![Err(
            "connection refused".to_string(),
        )])));

        let err = gateway
            .complete(&[Message::user("hi")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_maps_to_timeout() {
        let backend = MockBackend::with_replies(vec![Ok("too late".to_string())])
            .with_delay(Duration::from_millis(50));
        let gateway = CompletionGateway::new(Arc::new(backend));

        let err = gateway
            .complete(&[Message::user("hi")], Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UpstreamTimeout));
    }
}
