//! 内容生成管线：制品状态机
//!
//! 每个制品独立走 generating → completed / error：
//! 先落一条 generating 状态的记录拿到 id（draft 态与创建合并，外部不可见），
//! 再用 kind 对应的 prompt 调一次补全、做三层提取，最后按结果迁移状态。
//! 失败时只改 status，content 保持失败前的值；不自动重试，错误原样上抛。
//!
//! 并发：id 在创建后才开始生成，单个制品不会有两次并发生成；
//! 不同制品的生成请求之间无共享可变状态，完全并行。

use std::sync::Arc;
use std::time::Duration;

use crate::core::AgentError;
use crate::extract::{self, ExtractionTier};
use crate::generation::prompts;
use crate::generation::types::{
    slide_skeleton, GenerationRequest, LectureDraft, LectureOutline, SlideDraft,
    SlideFromSourceDraft,
};
use crate::llm::CompletionGateway;
use crate::models::{
    ArtifactStatus, Lecture, LectureUpdate, Message, SlideContent, SlideDeck, SlideDeckUpdate,
};
use crate::store::{LectureStore, SlideStore};

/// 生成管线：持有网关与两类制品存储，按请求 kind 分派
pub struct GenerationPipeline {
    gateway: Arc<CompletionGateway>,
    lectures: Arc<dyn LectureStore>,
    slides: Arc<dyn SlideStore>,
    /// 生成调用的时间预算；分类 / 聊天走各自更短的预算
    timeout: Duration,
}

impl GenerationPipeline {
    pub fn new(
        gateway: Arc<CompletionGateway>,
        lectures: Arc<dyn LectureStore>,
        slides: Arc<dyn SlideStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            lectures,
            slides,
            timeout,
        }
    }

    /// 统一入口：创建制品、生成内容、迁移状态，返回制品 id
    pub async fn run(&self, request: GenerationRequest) -> Result<String, AgentError> {
        tracing::info!(kind = request.kind(), "Generation request accepted");
        match request {
            GenerationRequest::Lecture(draft) => self.run_lecture(draft).await,
            GenerationRequest::Slide(draft) => self.run_slide(draft).await,
            GenerationRequest::SlideFromSource(options) => {
                self.run_slide_from_source(options).await
            }
        }
    }

    async fn run_lecture(&self, draft: LectureDraft) -> Result<String, AgentError> {
        let lecture = Lecture::new(
            draft.user_id.clone(),
            &draft.title,
            &draft.subject,
            &draft.requirements,
        )
        .with_grade(draft.grade.clone())
        .with_description(draft.description.clone())
        .with_status(ArtifactStatus::Generating);
        let id = self.lectures.create(lecture).await?;

        let request_text = format!(
            "Title: {}\nSubject: {}\nGrade: {}\nRequirements: {}",
            draft.title,
            draft.subject,
            draft.grade.as_deref().unwrap_or("unspecified"),
            draft.requirements,
        );

        match self.generate_outline(&request_text).await {
            Ok((outline, _tier)) => {
                let content = serde_json::to_value(&outline).unwrap_or_default();
                self.lectures
                    .update(
                        &id,
                        LectureUpdate {
                            content: Some(content),
                            status: Some(ArtifactStatus::Completed),
                            ..Default::default()
                        },
                    )
                    .await?;
                tracing::info!(artifact = %id, "Lecture generation completed");
                Ok(id)
            }
            Err(e) => {
                self.mark_lecture_error(&id).await;
                Err(e)
            }
        }
    }

    async fn run_slide(&self, draft: SlideDraft) -> Result<String, AgentError> {
        let deck = SlideDeck::new(
            draft.user_id.clone(),
            &draft.title,
            &draft.subject,
            &draft.requirements,
        )
        .with_presentation_type(draft.presentation_type.clone())
        .with_duration(draft.duration)
        .with_description(draft.description.clone())
        .with_status(ArtifactStatus::Generating);
        let id = self.slides.create(deck).await?;

        match self.generate_slides(&draft).await {
            Ok((slides, _tier)) => {
                self.complete_deck(&id, slides).await?;
                Ok(id)
            }
            Err(e) => {
                self.mark_deck_error(&id).await;
                Err(e)
            }
        }
    }

    async fn run_slide_from_source(
        &self,
        options: SlideFromSourceDraft,
    ) -> Result<String, AgentError> {
        // 源讲义缺失时显式上抛，不创建任何制品
        let lecture = self
            .lectures
            .get(&options.lecture_id)
            .await?
            .ok_or_else(|| AgentError::NotFound(format!("lecture {}", options.lecture_id)))?;

        let deck = SlideDeck::new(
            options.user_id.clone(),
            format!("Slides: {}", lecture.title),
            &lecture.subject,
            format!("Derived from the lecture \"{}\"", lecture.title),
        )
        .with_presentation_type(Some("lecture".to_string()))
        .with_description(Some(format!("Created from the lecture: {}", lecture.title)))
        .with_source_lecture(&options.lecture_id)
        .with_status(ArtifactStatus::Generating);
        let id = self.slides.create(deck).await?;

        match self.generate_slides_from_lecture(&lecture, &options).await {
            Ok((slides, _tier)) => {
                self.complete_deck(&id, slides).await?;
                Ok(id)
            }
            Err(e) => {
                self.mark_deck_error(&id).await;
                Err(e)
            }
        }
    }

    async fn complete_deck(&self, id: &str, slides: Vec<SlideContent>) -> Result<(), AgentError> {
        // slide_count 随 slides 一并由存储层重算
        self.slides
            .update(
                id,
                SlideDeckUpdate {
                    slides: Some(slides),
                    status: Some(ArtifactStatus::Completed),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(artifact = %id, "Slide generation completed");
        Ok(())
    }

    async fn mark_lecture_error(&self, id: &str) {
        // 只动 status；content 保持失败前的值
        if let Err(e) = self
            .lectures
            .update(
                id,
                LectureUpdate {
                    status: Some(ArtifactStatus::Error),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::error!(artifact = %id, "Failed to mark lecture as error: {}", e);
        }
    }

    async fn mark_deck_error(&self, id: &str) {
        if let Err(e) = self
            .slides
            .update(
                id,
                SlideDeckUpdate {
                    status: Some(ArtifactStatus::Error),
                    ..Default::default()
                },
            )
            .await
        {
            tracing::error!(artifact = %id, "Failed to mark slide deck as error: {}", e);
        }
    }

    /// 内容级入口：讲义大纲。Err 仅代表网关调用本身失败；
    /// 提取降级仍返回 Ok（骨架），层级随结果带回。
    pub async fn generate_outline(
        &self,
        request_text: &str,
    ) -> Result<(LectureOutline, ExtractionTier), AgentError> {
        let messages = vec![
            Message::system(prompts::LECTURE_OUTLINE_PROMPT),
            Message::user(format!("Request: {}", request_text)),
        ];
        let raw = self.gateway.complete(&messages, self.timeout).await?;

        let (outline, tier) = extract::extract_object(&raw, || LectureOutline::skeleton(&raw));
        if tier == ExtractionTier::Fallback {
            tracing::warn!("Lecture outline extraction degraded to skeleton");
        }
        Ok((outline, tier))
    }

    /// 内容级入口：平铺幻灯片
    pub async fn generate_slides(
        &self,
        draft: &SlideDraft,
    ) -> Result<(Vec<SlideContent>, ExtractionTier), AgentError> {
        let messages = vec![Message::system(prompts::slide_deck_prompt(draft))];
        let raw = self.gateway.complete(&messages, self.timeout).await?;

        let (slides, tier) = extract::extract_array(&raw, || slide_skeleton(&draft.title, &raw));
        if tier == ExtractionTier::Fallback {
            tracing::warn!("Slide extraction degraded to skeleton");
        }
        Ok((slides, tier))
    }

    /// 内容级入口：由讲义内容派生幻灯片
    pub async fn generate_slides_from_lecture(
        &self,
        lecture: &Lecture,
        options: &SlideFromSourceDraft,
    ) -> Result<(Vec<SlideContent>, ExtractionTier), AgentError> {
        let content_text = match &lecture.content {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        let messages = vec![Message::system(prompts::slides_from_lecture_prompt(
            &lecture.title,
            &lecture.subject,
            &content_text,
            options,
        ))];
        let raw = self.gateway.complete(&messages, self.timeout).await?;

        let skeleton_title = format!("Slides: {}", lecture.title);
        let (slides, tier) = extract::extract_array(&raw, || slide_skeleton(&skeleton_title, &raw));
        if tier == ExtractionTier::Fallback {
            tracing::warn!("Slide-from-lecture extraction degraded to skeleton");
        }
        Ok((slides, tier))
    }
}
