//! Prompt 模板
//!
//! 所有要求结构化输出的模板把目标 JSON 格式直接写进 system prompt；
//! 解析端（extract 模块）对不守格式的回复逐层降级，模板这边只负责把格式说清楚。

use crate::generation::types::{SlideDraft, SlideFromSourceDraft};

/// 派生幻灯片时送入 prompt 的讲义内容前缀上限（字符）
pub const SOURCE_CONTENT_MAX_CHARS: usize = 2000;

/// 意图分类 system prompt
pub const CLASSIFIER_PROMPT: &str = r#"You are an AI assistant that helps teachers prepare lessons. Analyze the user's message and determine the intent.

Possible intents:
- "create_lecture": the user wants a new lecture outline
- "create_slide": the user wants presentation slides
- "search": the user wants to find existing lectures or slides
- "chat": ordinary conversation or questions

Return JSON in this format:
{
    "intent": "intent_name",
    "entities": {
        "subject": "subject if present",
        "topic": "topic if present",
        "grade": "grade level if present"
    }
}"#;

/// 聊天 system prompt，嵌入最近若干轮上下文
pub fn chat_prompt(context: &str) -> String {
    format!(
        r#"You are an AI assistant that helps teachers prepare lessons. You can:

1. Advise on teaching methods
2. Suggest lecture content
3. Help design presentation slides
4. Answer questions about education

Conversation context:
{}

Reply in a helpful, friendly and professional way."#,
        context
    )
}

/// 讲义大纲生成 system prompt（内嵌目标 JSON schema）
pub const LECTURE_OUTLINE_PROMPT: &str = r#"You are an education expert. Create a detailed lecture outline based on the user's request.

Return JSON in this format:
{
    "title": "lecture title",
    "subject": "subject",
    "grade": "grade level (elementary/middle/high/university)",
    "duration": "duration in minutes",
    "objectives": ["objective 1", "objective 2", "..."],
    "outline": [
        {
            "section": "Part I: section name",
            "duration": "15 minutes",
            "topics": [
                {
                    "main_topic": "Main topic 1",
                    "subtopics": [
                        {
                            "subtitle": "Subtopic 1.1",
                            "content": "Detailed content...",
                            "activities": ["activity 1", "activity 2"]
                        }
                    ]
                }
            ]
        }
    ],
    "resources": ["resource 1", "resource 2"],
    "assessment": "assessment method"
}

Make the outline as detailed as possible and match the request."#;

/// 从用户消息中抽取幻灯片请求字段的 system prompt
pub const SLIDE_REQUEST_PROMPT: &str = r#"Extract the information needed to create presentation slides from the user's request.

Return JSON in this format:
{
    "title": "slide deck title",
    "subject": "subject",
    "presentation_type": "lecture/workshop/seminar/conference",
    "duration": 45,
    "requirements": "detailed requirements for the slide content"
}"#;

/// 幻灯片内容生成 system prompt
pub fn slide_deck_prompt(draft: &SlideDraft) -> String {
    format!(
        r#"You are an expert in educational slide design. Create slide content with these requirements:

Title: {}
Subject: {}
Presentation type: {}
Duration: {} minutes
Requirements: {}

Create 10-15 slides including:
1. A title slide
2. An objectives slide
3. Main content slides (8-10 slides)
4. A summary slide
5. A Q&A slide

Return a JSON array where each slide has this format:
{{
    "title": "slide title",
    "content": "slide content",
    "slide_type": "title/content/image/conclusion",
    "notes": "speaker notes"
}}"#,
        draft.title,
        draft.subject,
        draft.presentation_type.as_deref().unwrap_or("lecture"),
        draft.duration.unwrap_or(45),
        draft.requirements,
    )
}

/// 由讲义内容派生幻灯片的 system prompt；讲义正文截断到有界前缀
pub fn slides_from_lecture_prompt(
    title: &str,
    subject: &str,
    content: &str,
    options: &SlideFromSourceDraft,
) -> String {
    let prefix: String = content.chars().take(SOURCE_CONTENT_MAX_CHARS).collect();
    format!(
        r#"Create presentation slides from the following lecture content:

Lecture title: {}
Subject: {}
Content: {}...

Options:
- Introduction slide: {}
- Conclusion slide: {}
- Question slides: {}
- Style: {}

Create 8-12 slides as a JSON array in this format:
[
    {{
        "title": "slide title",
        "content": "slide content",
        "slide_type": "title/content/conclusion/question",
        "notes": "speaker notes"
    }}
]"#,
        title,
        subject,
        prefix,
        options.include_intro,
        options.include_conclusion,
        options.include_questions,
        options.style,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_content_is_truncated() {
        let options = SlideFromSourceDraft::new("lec-1");
        let long = "a".repeat(SOURCE_CONTENT_MAX_CHARS * 2);
        let prompt = slides_from_lecture_prompt("T", "S", &long, &options);
        // 前缀之外的部分不应进入 prompt
        assert!(prompt.len() < long.len());
        assert!(prompt.contains(&"a".repeat(SOURCE_CONTENT_MAX_CHARS)));
        assert!(!prompt.contains(&"a".repeat(SOURCE_CONTENT_MAX_CHARS + 1)));
    }

    #[test]
    fn test_slide_deck_prompt_fills_defaults() {
        let draft = SlideDraft {
            title: "算法入门".to_string(),
            subject: "CS".to_string(),
            presentation_type: None,
            duration: None,
            description: None,
            requirements: "basics".to_string(),
            user_id: None,
        };
        let prompt = slide_deck_prompt(&draft);
        assert!(prompt.contains("lecture"));
        assert!(prompt.contains("45 minutes"));
    }
}
