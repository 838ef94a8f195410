//! 会话轮次集成测试
//!
//! 用脚本化 Mock 后端和内存存储把 分类 → 路由 → 处理 → 合成 → 持久化
//! 整条链路跑通，覆盖讲义 / 幻灯片 / 搜索三类意图与并发轮次。

use std::sync::Arc;

use edubot::config::AppConfig;
use edubot::core::Orchestrator;
use edubot::llm::MockBackend;
use edubot::models::{ArtifactStatus, Lecture};
use edubot::store::{
    ChatStore, LectureStore, MemoryChatStore, MemoryLectureStore, MemorySlideStore, SlideStore,
};
use edubot::TurnRequest;

struct Fixture {
    orchestrator: Orchestrator,
    lectures: Arc<MemoryLectureStore>,
    slides: Arc<MemorySlideStore>,
    sessions: Arc<MemoryChatStore>,
}

fn fixture(replies: Vec<Result<String, String>>) -> Fixture {
    let lectures = Arc::new(MemoryLectureStore::new());
    let slides = Arc::new(MemorySlideStore::new());
    let sessions = Arc::new(MemoryChatStore::new());
    let orchestrator = Orchestrator::new(
        Arc::new(MockBackend::with_replies(replies)),
        lectures.clone() as Arc<dyn LectureStore>,
        slides.clone() as Arc<dyn SlideStore>,
        sessions.clone() as Arc<dyn ChatStore>,
        &AppConfig::default(),
    );
    Fixture {
        orchestrator,
        lectures,
        slides,
        sessions,
    }
}

fn request(message: &str, user: &str) -> TurnRequest {
    TurnRequest {
        message: message.to_string(),
        history: vec![],
        user_id: Some(user.to_string()),
        session_id: None,
    }
}

#[tokio::test]
async fn test_lecture_turn_with_valid_backend_output() {
    let fx = fixture(vec![
        Ok(r#"{"intent": "create_lecture", "entities": {"subject": "math", "grade": "6"}}"#
            .to_string()),
        Ok(r#"{"title": "Fractions for grade 6", "subject": "Math",
            "objectives": ["compare fractions"], "outline": [], "resources": [],
            "assessment": "quiz"}"#
            .to_string()),
    ]);

    let reply = fx
        .orchestrator
        .process(request("create a lecture on fractions for grade 6", "alice"))
        .await;

    assert!(reply.reply.starts_with("✅"));
    assert!(reply.reply.contains("Fractions for grade 6"));
    assert_eq!(reply.metadata["type"], "lecture");
    assert_eq!(reply.metadata["editable"], true);
    assert_eq!(reply.metadata["show_create_slide_button"], true);
}

#[tokio::test]
async fn test_slide_turn_materializes_completed_artifact() {
    let fx = fixture(vec![
        Ok(r#"{"intent": "create_slide", "entities": {"subject": "math"}}"#.to_string()),
        Ok(r#"{"title": "Fraction slides", "subject": "Math", "duration": 30,
            "requirements": "ten slides with pictures"}"#
            .to_string()),
        Ok(r#"[
            {"title": "Fraction slides", "content": "intro", "slide_type": "title"},
            {"title": "What is a fraction?", "content": "…", "slide_type": "content"},
            {"title": "Summary", "content": "…", "slide_type": "conclusion"}
        ]"#
        .to_string()),
    ]);

    let reply = fx
        .orchestrator
        .process(request("make slides about fractions", "alice"))
        .await;

    let slide_id = reply.metadata["slide_id"].as_str().unwrap();
    assert!(reply.reply.contains("being generated"));

    let deck = fx.slides.get(slide_id).await.unwrap().unwrap();
    assert_eq!(deck.status, ArtifactStatus::Completed);
    assert_eq!(deck.slide_count, 3);
    assert_eq!(deck.user_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_search_turn_finds_existing_documents() {
    let fx = fixture(vec![Ok(
        r#"{"intent": "search", "entities": {"topic": "fractions"}}"#.to_string()
    )]);
    fx.lectures
        .create(Lecture::new(
            Some("alice".to_string()),
            "Fractions revision",
            "Math",
            "…",
        ))
        .await
        .unwrap();

    let reply = fx
        .orchestrator
        .process(request("fractions", "alice"))
        .await;

    assert!(reply.reply.contains("📚"));
    assert!(reply.reply.contains("Fractions revision"));
    assert_eq!(
        reply.metadata["search_results"]["lectures"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_search_turn_with_no_documents_suggests_creation() {
    let fx = fixture(vec![Ok(
        r#"{"intent": "search", "entities": {}}"#.to_string()
    )]);

    let reply = fx
        .orchestrator
        .process(request("fractions", "alice"))
        .await;

    assert_eq!(
        reply.reply,
        "I couldn't find any matching documents. Would you like me to create one?"
    );
    assert!(reply.metadata.get("search_results").is_none());
}

#[tokio::test]
async fn test_concurrent_turns_for_different_users() {
    // 默认回显 Mock：分类解析失败回落 chat，聊天回显消息，与调用顺序无关
    let fx = Arc::new(fixture(vec![]));

    let mut handles = Vec::new();
    for user in ["alice", "bob", "carol"] {
        let fx = fx.clone();
        handles.push(tokio::spawn(async move {
            fx.orchestrator
                .process(request(&format!("hello from {}", user), user))
                .await
        }));
    }

    for handle in handles {
        let reply = handle.await.unwrap();
        assert!(!reply.reply.is_empty());
        let history = fx.sessions.history(&reply.session_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
    }
}

#[tokio::test]
async fn test_completed_artifact_is_stable_across_reads() {
    let fx = fixture(vec![
        Ok(r#"{"intent": "create_slide", "entities": {}}"#.to_string()),
        Ok(r#"{"title": "T", "subject": "S", "requirements": "r"}"#.to_string()),
        Ok(r#"[{"title": "only", "content": "…"}]"#.to_string()),
    ]);

    let reply = fx
        .orchestrator
        .process(request("slides please", "alice"))
        .await;
    let slide_id = reply.metadata["slide_id"].as_str().unwrap();

    let first = fx.slides.get(slide_id).await.unwrap().unwrap();
    let second = fx.slides.get(slide_id).await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
