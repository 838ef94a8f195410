//! 持久化协作方抽象
//!
//! 讲义 / 幻灯片 / 会话三类存储各定义一个接口，组件只依赖 trait 对象。
//! 假设单文档读写原子，不要求跨文档事务。

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::StoreError;
use crate::models::{
    ChatSession, ChatTurn, Lecture, LectureUpdate, SlideDeck, SlideDeckUpdate,
};

pub use memory::{MemoryChatStore, MemoryLectureStore, MemorySlideStore};

/// 讲义存储接口
#[async_trait]
pub trait LectureStore: Send + Sync {
    /// 写入新讲义，返回其 id
    async fn create(&self, lecture: Lecture) -> Result<String, StoreError>;

    /// 按 id 读取；不存在返回 None
    async fn get(&self, id: &str) -> Result<Option<Lecture>, StoreError>;

    /// 部分更新；返回是否确有文档被改动
    async fn update(&self, id: &str, update: LectureUpdate) -> Result<bool, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// 标题 / 学科 / 描述的大小写不敏感子串匹配，按创建时间倒序
    async fn search(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Lecture>, StoreError>;

    /// 分页列表（倒序），返回 (本页, 总数)
    async fn list(
        &self,
        user_id: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Lecture>, usize), StoreError>;
}

/// 幻灯片存储接口
#[async_trait]
pub trait SlideStore: Send + Sync {
    async fn create(&self, deck: SlideDeck) -> Result<String, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<SlideDeck>, StoreError>;

    /// 部分更新；slides 更新时实现方同步重算 slide_count
    async fn update(&self, id: &str, update: SlideDeckUpdate) -> Result<bool, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn search(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SlideDeck>, StoreError>;

    async fn list(
        &self,
        user_id: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<SlideDeck>, usize), StoreError>;
}

/// 会话列表项
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// 会话与消息存储接口；消息 append-only
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_session(&self, user_id: Option<&str>) -> Result<String, StoreError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, StoreError>;

    /// 追加一条消息并刷新会话 updated_at，返回消息 id
    async fn append_turn(&self, turn: ChatTurn) -> Result<String, StoreError>;

    /// 按时间正序取会话最近 limit 条消息
    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StoreError>;

    /// 用户的活跃会话列表，按 updated_at 倒序
    async fn sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError>;

    async fn set_title(&self, session_id: &str, title: &str) -> Result<(), StoreError>;

    /// 软删除：状态置 deleted，消息保留
    async fn delete_session(&self, session_id: &str) -> Result<bool, StoreError>;
}
