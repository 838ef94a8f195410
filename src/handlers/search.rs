//! 搜索处理器
//!
//! 在讲义与幻灯片两类存储中按消息文本检索（各自限量），
//! 拼成人类可读的清单；两边都为空时回一句固定的"没找到，要我新建吗"。

use std::sync::Arc;

use crate::core::TurnState;
use crate::store::{LectureStore, SlideStore};

/// 两类结果都为空时的固定回复
pub const NO_RESULTS_REPLY: &str =
    "I couldn't find any matching documents. Would you like me to create one?";

pub struct SearchHandler {
    lectures: Arc<dyn LectureStore>,
    slides: Arc<dyn SlideStore>,
    /// 每类制品的结果上限
    limit: usize,
}

impl SearchHandler {
    pub fn new(lectures: Arc<dyn LectureStore>, slides: Arc<dyn SlideStore>, limit: usize) -> Self {
        Self {
            lectures,
            slides,
            limit,
        }
    }

    pub async fn handle(&self, state: TurnState) -> TurnState {
        let user_id = state.user_id.clone();
        let lectures = self
            .lectures
            .search(&state.message, user_id.as_deref(), self.limit)
            .await;
        let decks = self
            .slides
            .search(&state.message, user_id.as_deref(), self.limit)
            .await;

        let (lectures, decks) = match (lectures, decks) {
            (Ok(l), Ok(d)) => (l, d),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Search against document store failed: {}", e);
                return state
                    .with_error_reply("Something went wrong while searching. Please try again.");
            }
        };

        if lectures.is_empty() && decks.is_empty() {
            return state.with_response(NO_RESULTS_REPLY);
        }

        let mut parts = vec!["I found these documents:\n".to_string()];
        if !lectures.is_empty() {
            parts.push("📚 **Lectures:**".to_string());
            for lecture in &lectures {
                parts.push(format!("- {} ({})", lecture.title, lecture.subject));
            }
        }
        if !decks.is_empty() {
            parts.push("\n🎯 **Slides:**".to_string());
            for deck in &decks {
                parts.push(format!("- {} ({} slides)", deck.title, deck.slide_count));
            }
        }

        let results = serde_json::json!({
            "lectures": lectures
                .iter()
                .map(|l| serde_json::json!({
                    "id": l.id,
                    "title": l.title,
                    "subject": l.subject,
                    "status": l.status,
                }))
                .collect::<Vec<_>>(),
            "slides": decks
                .iter()
                .map(|d| serde_json::json!({
                    "id": d.id,
                    "title": d.title,
                    "subject": d.subject,
                    "slide_count": d.slide_count,
                    "status": d.status,
                }))
                .collect::<Vec<_>>(),
        });

        state
            .with_response(parts.join("\n"))
            .with_metadata_entry("search_results", results)
            .with_tool("search")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lecture, SlideDeck};
    use crate::store::{MemoryLectureStore, MemorySlideStore};

    fn handler() -> (SearchHandler, Arc<MemoryLectureStore>, Arc<MemorySlideStore>) {
        let lectures = Arc::new(MemoryLectureStore::new());
        let slides = Arc::new(MemorySlideStore::new());
        (
            SearchHandler::new(
                lectures.clone() as Arc<dyn LectureStore>,
                slides.clone() as Arc<dyn SlideStore>,
                3,
            ),
            lectures,
            slides,
        )
    }

    #[tokio::test]
    async fn test_no_results_is_exact_fallback_without_metadata() {
        let (handler, _, _) = handler();
        let state = handler
            .handle(TurnState::new("fractions", vec![], None))
            .await;

        assert_eq!(state.response.as_deref(), Some(NO_RESULTS_REPLY));
        assert!(state.metadata.get("search_results").is_none());
        assert!(state.tools_used.is_empty());
    }

    #[tokio::test]
    async fn test_results_listed_with_metadata() {
        let (handler, lectures, slides) = handler();
        lectures
            .create(Lecture::new(None, "Fractions basics", "Math", "…"))
            .await
            .unwrap();
        let mut deck = SlideDeck::new(None, "Fractions deck", "Math", "…");
        deck.slide_count = 7;
        slides.create(deck).await.unwrap();

        let state = handler
            .handle(TurnState::new("fractions", vec![], None))
            .await;

        let response = state.response.as_deref().unwrap();
        assert!(response.contains("📚"));
        assert!(response.contains("- Fractions basics (Math)"));
        assert!(response.contains("- Fractions deck (7 slides)"));

        let results = state.metadata.get("search_results").unwrap();
        assert_eq!(results["lectures"].as_array().unwrap().len(), 1);
        assert_eq!(results["slides"][0]["slide_count"], 7);
        assert_eq!(state.tools_used, vec!["search".to_string()]);
    }

    #[tokio::test]
    async fn test_results_capped_per_kind() {
        let (handler, lectures, _) = handler();
        for i in 0..5 {
            lectures
                .create(Lecture::new(None, format!("Algebra {}", i), "Math", "…"))
                .await
                .unwrap();
        }

        let state = handler.handle(TurnState::new("algebra", vec![], None)).await;
        let results = state.metadata.get("search_results").unwrap();
        assert_eq!(results["lectures"].as_array().unwrap().len(), 3);
    }
}
