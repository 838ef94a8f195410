//! 生成请求与结构化产物类型
//!
//! 请求一经构造即不可变；骨架构造函数是提取器第三层兜底的唯一来源。

use serde::{Deserialize, Serialize};

use crate::models::SlideContent;

/// 讲义生成请求
#[derive(Debug, Clone)]
pub struct LectureDraft {
    pub title: String,
    pub subject: String,
    pub grade: Option<String>,
    pub description: Option<String>,
    pub requirements: String,
    pub user_id: Option<String>,
}

/// 幻灯片生成请求
#[derive(Debug, Clone)]
pub struct SlideDraft {
    pub title: String,
    pub subject: String,
    pub presentation_type: Option<String>,
    pub duration: Option<u32>,
    pub description: Option<String>,
    pub requirements: String,
    pub user_id: Option<String>,
}

/// 由已有讲义派生幻灯片的请求
#[derive(Debug, Clone)]
pub struct SlideFromSourceDraft {
    pub lecture_id: String,
    pub include_intro: bool,
    pub include_conclusion: bool,
    pub include_questions: bool,
    /// professional / creative / minimal
    pub style: String,
    pub user_id: Option<String>,
}

impl SlideFromSourceDraft {
    pub fn new(lecture_id: impl Into<String>) -> Self {
        Self {
            lecture_id: lecture_id.into(),
            include_intro: true,
            include_conclusion: true,
            include_questions: false,
            style: "professional".to_string(),
            user_id: None,
        }
    }
}

/// 管线入口的统一请求：kind 决定 prompt 模板与落盘的制品类型
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Lecture(LectureDraft),
    Slide(SlideDraft),
    SlideFromSource(SlideFromSourceDraft),
}

impl GenerationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationRequest::Lecture(_) => "lecture",
            GenerationRequest::Slide(_) => "slide",
            GenerationRequest::SlideFromSource(_) => "slide_from_source",
        }
    }
}

/// 讲义大纲（与 prompt 中给模型的 JSON 格式一一对应）
///
/// 所有字段带 default：模型给出部分字段时也能落地，缺的留空。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LectureOutline {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub outline: Vec<OutlineSection>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub assessment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineSection {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub topics: Vec<OutlineTopic>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineTopic {
    #[serde(default)]
    pub main_topic: String,
    #[serde(default)]
    pub subtopics: Vec<OutlineSubtopic>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineSubtopic {
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

impl LectureOutline {
    /// 提取完全失败时的单节骨架：正文取原始回复的前 200 字符
    pub fn skeleton(raw: &str) -> Self {
        let mut content: String = raw.chars().take(200).collect();
        content.push_str("...");

        Self {
            title: "Requested lecture".to_string(),
            subject: "General".to_string(),
            grade: "elementary".to_string(),
            duration: "45 minutes".to_string(),
            objectives: vec!["Understand the core ideas".to_string()],
            outline: vec![OutlineSection {
                section: "Main section".to_string(),
                duration: "30 minutes".to_string(),
                topics: vec![OutlineTopic {
                    main_topic: "Key content".to_string(),
                    subtopics: vec![OutlineSubtopic {
                        subtitle: "Details".to_string(),
                        content,
                        activities: vec!["Discussion".to_string(), "Practice".to_string()],
                    }],
                }],
            }],
            resources: vec!["Reference material".to_string()],
            assessment: "Assessed through exercises".to_string(),
        }
    }
}

/// 幻灯片提取失败时的单页骨架：整份原始回复作为唯一一页的内容
pub fn slide_skeleton(title: &str, raw: &str) -> Vec<SlideContent> {
    vec![SlideContent {
        title: title.to_string(),
        content: raw.to_string(),
        slide_type: "content".to_string(),
        notes: Some("Generated automatically".to_string()),
    }]
}
