//! 意图识别
//!
//! 把自由文本消息映射到封闭意图集合之一，并带出 subject / topic / grade 实体。
//! 契约：无论后端回复长什么样，分类器都必须给出一个合法意图。
//! 结构化输出解析不动时回落到 Chat + 空实体，绝不让一轮会话因此失败。
//! 每次分类只调一次补全，不重试。

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::TurnState;
use crate::extract::{self, ExtractionTier};
use crate::generation::prompts;
use crate::llm::CompletionGateway;
use crate::models::Message;

/// 封闭意图集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateLecture,
    CreateSlide,
    Search,
    Chat,
}

/// 分类时顺带抽取的实体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentEntities {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// 模型回复的 wire 结构：intent 先按字符串收下，再映射到封闭枚举
#[derive(Debug, Default, Deserialize)]
struct RawClassification {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    entities: IntentEntities,
}

fn intent_from_str(s: &str) -> Intent {
    match s {
        "create_lecture" => Intent::CreateLecture,
        "create_slide" => Intent::CreateSlide,
        "search" => Intent::Search,
        // 未知 / 缺失一律当普通聊天
        _ => Intent::Chat,
    }
}

/// 意图分类器
pub struct IntentClassifier {
    gateway: Arc<CompletionGateway>,
    timeout: Duration,
    /// 随消息一起送入的历史轮数上限
    context_turns: usize,
}

impl IntentClassifier {
    pub fn new(gateway: Arc<CompletionGateway>, timeout: Duration, context_turns: usize) -> Self {
        Self {
            gateway,
            timeout,
            context_turns,
        }
    }

    /// 分类阶段：填充 intent / entities 后返回新状态
    pub async fn classify(&self, state: TurnState) -> TurnState {
        let mut messages = vec![Message::system(prompts::CLASSIFIER_PROMPT)];

        if !state.history.is_empty() {
            let start = state.history.len().saturating_sub(self.context_turns);
            let context: String = state.history[start..]
                .iter()
                .map(|t| format!("{}: {}\n", t.sender, t.content))
                .collect();
            messages.push(Message::system(format!(
                "Recent conversation:\n{}",
                context
            )));
        }
        messages.push(Message::user(format!("User message: {}", state.message)));

        let raw = match self.gateway.complete(&messages, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                // 后端不可用也不中断本轮：按普通聊天继续
                tracing::warn!("Intent classification call failed, defaulting to chat: {}", e);
                return state.with_classification(Intent::Chat, IntentEntities::default());
            }
        };

        let (parsed, tier) = extract::extract_object(&raw, RawClassification::default);
        if tier == ExtractionTier::Fallback {
            tracing::debug!("Classifier output unparseable, defaulting to chat");
        }

        let intent = intent_from_str(&parsed.intent);
        tracing::info!(?intent, "Intent detected");
        state.with_classification(intent, parsed.entities)
    }
}
