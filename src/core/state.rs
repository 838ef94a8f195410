//! 轮次状态：一次会话轮的不可变记录
//!
//! 每个管线阶段（分类 → 路由 → 处理 → 合成）接收一个 TurnState、
//! 返回一个新的 TurnState，阶段之间没有共享可变状态，顺序与测试都因此确定。
//! 会话连续性靠持久化历史，不靠这条记录；轮次结束即丢弃。

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, IntentEntities};

/// 历史中的一轮消息（调用方传入或由编排器从会话存储加载）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub sender: String,
    pub content: String,
}

/// 轮次处理入口的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// 轮次处理的最终回复
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply: String,
    pub session_id: String,
    pub metadata: serde_json::Value,
}

/// 一轮会话的全部状态；阶段方法消费 self 并返回新状态
#[derive(Debug, Clone)]
pub struct TurnState {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub user_id: Option<String>,
    pub intent: Option<Intent>,
    pub entities: IntentEntities,
    pub response: Option<String>,
    pub tools_used: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TurnState {
    pub fn new(message: impl Into<String>, history: Vec<HistoryTurn>, user_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            history,
            user_id,
            intent: None,
            entities: IntentEntities::default(),
            response: None,
            tools_used: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// 分类阶段：填入意图与实体
    pub fn with_classification(mut self, intent: Intent, entities: IntentEntities) -> Self {
        self.intent = Some(intent);
        self.entities = entities;
        self
    }

    /// 处理阶段：填入回复文本
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// 记录本轮调用过的处理器
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools_used.push(name.into());
        self
    }

    pub fn with_metadata_entry(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// 处理器内部失败的统一出口：回复 + error 标记，不向外抛
    pub fn with_error_reply(self, response: impl Into<String>) -> Self {
        self.with_response(response)
            .with_metadata_entry("error", serde_json::Value::Bool(true))
    }

    pub fn metadata_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_return_new_state() {
        let state = TurnState::new("hello", vec![], None);
        let state = state.with_classification(Intent::Chat, IntentEntities::default());
        let state = state.with_response("hi").with_tool("chat_completion");

        assert_eq!(state.intent, Some(Intent::Chat));
        assert_eq!(state.response.as_deref(), Some("hi"));
        assert_eq!(state.tools_used, vec!["chat_completion".to_string()]);
    }

    #[test]
    fn test_error_reply_sets_flag() {
        let state = TurnState::new("hello", vec![], None).with_error_reply("sorry");
        assert_eq!(state.metadata.get("error"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(state.response.as_deref(), Some("sorry"));
    }
}
