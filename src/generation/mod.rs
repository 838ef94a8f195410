//! 内容生成：请求类型、prompt 模板与制品状态机管线

pub mod pipeline;
pub mod prompts;
pub mod types;

pub use pipeline::GenerationPipeline;
pub use types::{
    slide_skeleton, GenerationRequest, LectureDraft, LectureOutline, OutlineSection,
    OutlineSubtopic, OutlineTopic, SlideDraft, SlideFromSourceDraft,
};
