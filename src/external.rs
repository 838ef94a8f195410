//! 外部资源助手：对外部 agent 服务的薄透传
//!
//! 搜索 / 内容增强 / 资源获取 / 翻译 / 事实核查，全部是一次 HTTP 调用、
//! 无内部逻辑。任何失败都归一成 `{"status": "error", ...}` 形状的 JSON，
//! 不向调用方抛错。

use std::time::Duration;

use serde_json::{json, Value};

/// 外部资源助手客户端
pub struct ExternalTools {
    client: reqwest::Client,
    base_url: String,
}

impl ExternalTools {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, reqwest::Error> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }

    /// 网络搜索教育内容
    pub async fn web_search(&self, query: &str, num_results: u32) -> Value {
        match self
            .post("/search", json!({"query": query, "num_results": num_results}))
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("External web search failed: {}", e);
                json!({"status": "error", "results": [], "error": e.to_string()})
            }
        }
    }

    /// 用外部来源增强内容
    pub async fn enrich_content(&self, topic: &str, subject: &str, content_type: &str) -> Value {
        match self
            .post(
                "/enrich-content",
                json!({"topic": topic, "subject": subject, "content_type": content_type}),
            )
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("External content enrichment failed: {}", e);
                json!({"status": "error", "enriched_content": "", "sources": [], "error": e.to_string()})
            }
        }
    }

    /// 获取外部教学资源
    pub async fn external_resources(
        &self,
        subject: &str,
        grade_level: &str,
        topic: &str,
        resource_type: &str,
    ) -> Value {
        match self
            .post(
                "/get-resources",
                json!({
                    "subject": subject,
                    "grade_level": grade_level,
                    "topic": topic,
                    "resource_type": resource_type,
                }),
            )
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("External resource lookup failed: {}", e);
                json!({"status": "error", "resources": [], "error": e.to_string()})
            }
        }
    }

    /// 翻译内容；失败时原样退回输入文本
    pub async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Value {
        match self
            .post(
                "/translate",
                json!({"text": text, "source_lang": source_lang, "target_lang": target_lang}),
            )
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("External translation failed: {}", e);
                json!({"status": "error", "translated_text": text, "error": e.to_string()})
            }
        }
    }

    /// 事实核查
    pub async fn fact_check(&self, content: &str, topic: &str) -> Value {
        match self
            .post("/fact-check", json!({"content": content, "topic": topic}))
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("External fact check failed: {}", e);
                json!({
                    "status": "error",
                    "fact_check_result": "Unable to verify",
                    "confidence_score": 0.0,
                    "error": e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_error_shape() {
        // 无人监听的本地端口：立即连接失败
        let tools = ExternalTools::new("http://127.0.0.1:1", Duration::from_millis(200));

        let result = tools.web_search("fractions", 5).await;
        assert_eq!(result["status"], "error");
        assert!(result["results"].as_array().unwrap().is_empty());

        let translated = tools.translate("xin chào", "vi", "en").await;
        assert_eq!(translated["status"], "error");
        assert_eq!(translated["translated_text"], "xin chào");
    }
}
