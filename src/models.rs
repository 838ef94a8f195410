//! 领域模型：LLM 消息、制品（讲义 / 幻灯片）与会话记录
//!
//! 制品状态机 generating → completed / error 由 generation::pipeline 驱动；
//! 本模块只定义数据形状与构造函数，所有 wire 枚举统一 snake_case。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 发往 LLM 的单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 生成新的制品 / 会话 ID（UUID v4 字符串）
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 制品状态
///
/// completed 时 content 必须非空且结构良好；error 时 content 保持失败前的值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Draft,
    Generating,
    Completed,
    Error,
}

impl ArtifactStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ArtifactStatus::Completed | ArtifactStatus::Error)
    }
}

/// 单页幻灯片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// title / content / image / chart / conclusion / question
    #[serde(default = "default_slide_type")]
    pub slide_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_slide_type() -> String {
    "content".to_string()
}

/// 讲义制品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub subject: String,
    /// elementary / middle / high / university
    pub grade: Option<String>,
    pub description: Option<String>,
    pub requirements: String,
    /// 结构化大纲（JSON），生成完成前为 None
    pub content: Option<serde_json::Value>,
    pub status: ArtifactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lecture {
    pub fn new(
        user_id: Option<String>,
        title: impl Into<String>,
        subject: impl Into<String>,
        requirements: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id,
            title: title.into(),
            subject: subject.into(),
            grade: None,
            description: None,
            requirements: requirements.into(),
            content: None,
            status: ArtifactStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_grade(mut self, grade: Option<String>) -> Self {
        self.grade = grade;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_status(mut self, status: ArtifactStatus) -> Self {
        self.status = status;
        self
    }
}

/// 讲义部分更新：None 字段不触碰
#[derive(Debug, Clone, Default)]
pub struct LectureUpdate {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub content: Option<serde_json::Value>,
    pub status: Option<ArtifactStatus>,
}

/// 幻灯片制品（一组 slides + 派生的 slide_count）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideDeck {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub subject: String,
    /// lecture / workshop / seminar / conference
    pub presentation_type: Option<String>,
    /// 分钟
    pub duration: Option<u32>,
    pub description: Option<String>,
    pub requirements: String,
    pub slides: Vec<SlideContent>,
    pub slide_count: usize,
    pub status: ArtifactStatus,
    /// 由讲义派生时记录来源
    pub source_lecture_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlideDeck {
    pub fn new(
        user_id: Option<String>,
        title: impl Into<String>,
        subject: impl Into<String>,
        requirements: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id,
            title: title.into(),
            subject: subject.into(),
            presentation_type: None,
            duration: None,
            description: None,
            requirements: requirements.into(),
            slides: Vec::new(),
            slide_count: 0,
            status: ArtifactStatus::Draft,
            source_lecture_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_presentation_type(mut self, presentation_type: Option<String>) -> Self {
        self.presentation_type = presentation_type;
        self
    }

    pub fn with_duration(mut self, duration: Option<u32>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_source_lecture(mut self, lecture_id: impl Into<String>) -> Self {
        self.source_lecture_id = Some(lecture_id.into());
        self
    }

    pub fn with_status(mut self, status: ArtifactStatus) -> Self {
        self.status = status;
        self
    }
}

/// 幻灯片部分更新：slides 更新时由存储层同步重算 slide_count
#[derive(Debug, Clone, Default)]
pub struct SlideDeckUpdate {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub presentation_type: Option<String>,
    pub duration: Option<u32>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub slides: Option<Vec<SlideContent>>,
    pub status: Option<ArtifactStatus>,
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Deleted,
}

/// 聊天会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id,
            title: "New Chat".to_string(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 持久化消息的发送方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// 持久化的一条会话消息（append-only，写入后不再修改）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub session_id: String,
    pub content: String,
    pub sender: Sender,
    /// text / lecture / ...，前端据此选择渲染方式
    pub message_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(
        session_id: impl Into<String>,
        content: impl Into<String>,
        sender: Sender,
    ) -> Self {
        Self {
            id: new_id(),
            session_id: session_id.into(),
            content: content.into(),
            sender,
            message_type: "text".to_string(),
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        // 讲义回复带 lecture 元数据时同步标记消息类型
        if metadata.get("type").and_then(|v| v.as_str()) == Some("lecture") {
            self.message_type = "lecture".to_string();
        }
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_finished() {
        assert!(!ArtifactStatus::Generating.is_finished());
        assert!(ArtifactStatus::Completed.is_finished());
        assert!(ArtifactStatus::Error.is_finished());
    }

    #[test]
    fn test_status_snake_case_wire_format() {
        let s = serde_json::to_string(&ArtifactStatus::Generating).unwrap();
        assert_eq!(s, "\"generating\"");
    }

    #[test]
    fn test_lecture_turn_metadata_sets_message_type() {
        let turn = ChatTurn::new("s1", "outline", Sender::Assistant)
            .with_metadata(serde_json::json!({"type": "lecture", "editable": true}));
        assert_eq!(turn.message_type, "lecture");

        let plain = ChatTurn::new("s1", "hello", Sender::Assistant)
            .with_metadata(serde_json::json!({"foo": 1}));
        assert_eq!(plain.message_type, "text");
    }

    #[test]
    fn test_slide_content_defaults() {
        let slide: SlideContent =
            serde_json::from_str(r#"{"title": "Intro", "content": "..."}"#).unwrap();
        assert_eq!(slide.slide_type, "content");
        assert!(slide.notes.is_none());
    }
}
