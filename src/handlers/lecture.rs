//! 讲义创建处理器
//!
//! 走管线的内容级入口生成结构化大纲（不落制品，大纲以可编辑 payload
//! 直接返回给前端）。提取完全失败时由骨架兜底：单节大纲，
//! 正文取原始回复的前 200 字符。

use std::sync::Arc;

use crate::core::TurnState;
use crate::generation::GenerationPipeline;
use crate::handlers::degraded_reply;

pub struct LectureHandler {
    pipeline: Arc<GenerationPipeline>,
}

impl LectureHandler {
    pub fn new(pipeline: Arc<GenerationPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(&self, state: TurnState) -> TurnState {
        match self.pipeline.generate_outline(&state.message).await {
            Ok((outline, _tier)) => {
                let title = outline.title.clone();
                let lecture_data = serde_json::to_value(&outline).unwrap_or_default();

                state
                    .with_response(format!("✅ **Lecture outline: {}**\n\n", title))
                    .with_metadata_entry("type", serde_json::json!("lecture"))
                    .with_metadata_entry("lecture_data", lecture_data)
                    .with_metadata_entry("editable", serde_json::json!(true))
                    .with_metadata_entry("show_create_slide_button", serde_json::json!(true))
                    .with_tool("create_lecture")
            }
            Err(e) => {
                tracing::error!("Lecture outline generation failed: {}", e);
                let reply = degraded_reply(&e);
                state.with_error_reply(reply)
            }
        }
    }
}
