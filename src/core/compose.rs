//! 回复合成：轮次收尾
//!
//! 保证 response 永不为空：没有处理器给出回复时换成追问澄清的消息；
//! metadata 原样透传。

use crate::core::TurnState;

/// 所有处理器都没给出回复时的兜底追问
pub const CLARIFY_REPLY: &str =
    "I didn't quite catch what you need. Could you describe it in more detail?";

/// 合成阶段：确保回复非空
pub fn finalize(state: TurnState) -> TurnState {
    match state.response.as_deref() {
        Some(r) if !r.trim().is_empty() => state,
        _ => state.with_response(CLARIFY_REPLY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_response_replaced_with_clarification() {
        let state = finalize(TurnState::new("hm", vec![], None));
        assert_eq!(state.response.as_deref(), Some(CLARIFY_REPLY));
    }

    #[test]
    fn test_blank_response_replaced_with_clarification() {
        let state = finalize(TurnState::new("hm", vec![], None).with_response("   "));
        assert_eq!(state.response.as_deref(), Some(CLARIFY_REPLY));
    }

    #[test]
    fn test_existing_response_kept_and_metadata_passed_through() {
        let state = TurnState::new("hm", vec![], None)
            .with_response("done")
            .with_metadata_entry("type", serde_json::json!("lecture"));
        let state = finalize(state);
        assert_eq!(state.response.as_deref(), Some("done"));
        assert_eq!(state.metadata.get("type"), Some(&serde_json::json!("lecture")));
    }
}
