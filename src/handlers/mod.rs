//! 任务处理器：chat / create-lecture / create-slide / search
//!
//! 每个处理器只负责一种会话能力，自己吞掉自己的失败：
//! 任何错误都转成面向用户的回复 + error 元数据标记，绝不逃逸出处理器导致整轮崩溃。

pub mod chat;
pub mod lecture;
pub mod search;
pub mod slide;

pub use chat::ChatHandler;
pub use lecture::LectureHandler;
pub use search::SearchHandler;
pub use slide::SlideHandler;

use crate::core::AgentError;

/// 上游失败对应的用户话术；超时明确提示稍后重试
pub(crate) fn degraded_reply(err: &AgentError) -> &'static str {
    match err {
        AgentError::UpstreamTimeout => {
            "The content service is responding slowly right now. Please try again in a moment."
        }
        _ => "Sorry, I ran into a problem handling that request. Please try again.",
    }
}
