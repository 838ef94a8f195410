//! 幻灯片创建处理器
//!
//! 两步：先从用户消息抽取幻灯片请求字段（标题 / 学科 / 类型 / 时长 / 要求），
//! 再同步调用生成管线落制品。回复只报告"正在生成"加新制品 id；
//! 对用户而言内容生成是带外完成的，制品初始状态即 generating。

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::core::TurnState;
use crate::extract;
use crate::generation::{prompts, GenerationPipeline, GenerationRequest, SlideDraft};
use crate::handlers::degraded_reply;
use crate::llm::CompletionGateway;
use crate::models::Message;

/// 从消息里抽出来的幻灯片请求字段
#[derive(Debug, Deserialize)]
struct SlideRequestFields {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    presentation_type: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    requirements: String,
}

impl SlideRequestFields {
    fn skeleton(message: &str) -> Self {
        Self {
            title: "Requested slides".to_string(),
            subject: "General".to_string(),
            presentation_type: None,
            duration: None,
            requirements: message.to_string(),
        }
    }
}

pub struct SlideHandler {
    gateway: Arc<CompletionGateway>,
    pipeline: Arc<GenerationPipeline>,
    /// 字段抽取是短调用，不用生成级预算
    timeout: Duration,
}

impl SlideHandler {
    pub fn new(
        gateway: Arc<CompletionGateway>,
        pipeline: Arc<GenerationPipeline>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            pipeline,
            timeout,
        }
    }

    pub async fn handle(&self, state: TurnState) -> TurnState {
        let messages = vec![
            Message::system(prompts::SLIDE_REQUEST_PROMPT),
            Message::user(format!("Request: {}", state.message)),
        ];
        let raw = match self.gateway.complete(&messages, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Slide request extraction failed: {}", e);
                let reply = degraded_reply(&e);
                return state.with_error_reply(reply);
            }
        };

        let (fields, _tier) =
            extract::extract_object(&raw, || SlideRequestFields::skeleton(&state.message));

        let draft = SlideDraft {
            title: if fields.title.is_empty() {
                "New slides".to_string()
            } else {
                fields.title
            },
            subject: if fields.subject.is_empty() {
                state.entities.subject.clone().unwrap_or_default()
            } else {
                fields.subject
            },
            presentation_type: fields.presentation_type,
            duration: fields.duration,
            description: None,
            requirements: if fields.requirements.is_empty() {
                state.message.clone()
            } else {
                fields.requirements
            },
            user_id: state.user_id.clone(),
        };
        let title = draft.title.clone();

        match self.pipeline.run(GenerationRequest::Slide(draft)).await {
            Ok(slide_id) => state
                .with_response(format!(
                    "I've created the slide deck \"{}\". Its content is being generated and will be ready shortly.",
                    title
                ))
                .with_metadata_entry("slide_id", serde_json::json!(slide_id))
                .with_tool("create_slide"),
            Err(e) => {
                tracing::error!("Slide generation failed: {}", e);
                let reply = degraded_reply(&e);
                state.with_error_reply(reply)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockBackend;
    use crate::models::ArtifactStatus;
    use crate::store::{LectureStore, MemoryLectureStore, MemorySlideStore, SlideStore};

    fn handler_with(
        backend: MockBackend,
        pipeline_timeout: Duration,
    ) -> (SlideHandler, Arc<MemorySlideStore>) {
        let slides = Arc::new(MemorySlideStore::new());
        let gateway = Arc::new(CompletionGateway::new(Arc::new(backend)));
        let pipeline = Arc::new(GenerationPipeline::new(
            gateway.clone(),
            Arc::new(MemoryLectureStore::new()) as Arc<dyn LectureStore>,
            slides.clone() as Arc<dyn SlideStore>,
            pipeline_timeout,
        ));
        (
            SlideHandler::new(gateway, pipeline, Duration::from_secs(5)),
            slides,
        )
    }

    #[tokio::test]
    async fn test_slides_created_and_id_reported() {
        let backend = MockBackend::with_replies(vec![
            Ok(r#"{"title": "Fractions", "subject": "Math", "duration": 45, "requirements": "visual"}"#
                .to_string()),
            Ok(r#"[{"title": "Intro", "content": "…", "slide_type": "title"}]"#.to_string()),
        ]);
        let (handler, slides) = handler_with(backend, Duration::from_secs(5));

        let state = handler
            .handle(TurnState::new("make slides about fractions", vec![], None))
            .await;

        let slide_id = state.metadata.get("slide_id").unwrap().as_str().unwrap();
        let deck = slides.get(slide_id).await.unwrap().unwrap();
        assert_eq!(deck.status, ArtifactStatus::Completed);
        assert_eq!(deck.title, "Fractions");
        assert!(state
            .response
            .as_deref()
            .unwrap()
            .contains("being generated"));
        assert_eq!(state.tools_used, vec!["create_slide".to_string()]);
    }

    #[tokio::test]
    async fn test_unparseable_fields_fall_back_to_message() {
        let backend = MockBackend::with_replies(vec![
            Ok("no structure at all".to_string()),
            Ok(r#"[{"title": "S1", "content": "…"}]"#.to_string()),
        ]);
        let (handler, slides) = handler_with(backend, Duration::from_secs(5));

        let state = handler
            .handle(TurnState::new("slides about the water cycle", vec![], None))
            .await;

        let slide_id = state.metadata.get("slide_id").unwrap().as_str().unwrap();
        let deck = slides.get(slide_id).await.unwrap().unwrap();
        assert_eq!(deck.title, "Requested slides");
        assert_eq!(deck.requirements, "slides about the water cycle");
    }

    #[tokio::test]
    async fn test_generation_timeout_reports_retryable_error() {
        // 字段抽取走即时网关；生成走延迟网关并配更小的预算，必然超时
        let slides = Arc::new(MemorySlideStore::new());
        let extraction_gateway = Arc::new(CompletionGateway::new(Arc::new(
            MockBackend::with_replies(vec![Ok(
                r#"{"title": "T", "subject": "S", "requirements": "r"}"#.to_string(),
            )]),
        )));
        let slow_gateway = Arc::new(CompletionGateway::new(Arc::new(
            MockBackend::with_replies(vec![Ok("never arrives".to_string())])
                .with_delay(Duration::from_millis(50)),
        )));
        let pipeline = Arc::new(GenerationPipeline::new(
            slow_gateway,
            Arc::new(MemoryLectureStore::new()) as Arc<dyn LectureStore>,
            slides.clone() as Arc<dyn SlideStore>,
            Duration::from_millis(5),
        ));
        let handler = SlideHandler::new(extraction_gateway, pipeline, Duration::from_secs(5));

        let state = handler
            .handle(TurnState::new("slides please", vec![], None))
            .await;

        assert_eq!(state.metadata.get("error"), Some(&serde_json::Value::Bool(true)));
        assert!(state.response.as_deref().unwrap().contains("try again"));

        // 制品停在 error，内容保持为空
        let (all, total) = slides.list(None, 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(all[0].status, ArtifactStatus::Error);
        assert!(all[0].slides.is_empty());
    }
}
