//! 内存存储实现
//!
//! RwLock<HashMap> 一把锁一类文档，单文档读写天然原子。
//! 开发 / 测试默认后端；生产部署换成实现同一组 trait 的数据库版本。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::core::StoreError;
use crate::models::{
    ChatSession, ChatTurn, Lecture, LectureUpdate, SessionStatus, SlideDeck, SlideDeckUpdate,
};
use crate::store::{ChatStore, LectureStore, SessionSummary, SlideStore};

/// 大小写不敏感的子串匹配
fn matches_query(query: &str, fields: &[&str]) -> bool {
    let needle = query.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// 内存讲义存储
#[derive(Default)]
pub struct MemoryLectureStore {
    lectures: RwLock<HashMap<String, Lecture>>,
}

impl MemoryLectureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LectureStore for MemoryLectureStore {
    async fn create(&self, lecture: Lecture) -> Result<String, StoreError> {
        let id = lecture.id.clone();
        self.lectures.write().await.insert(id.clone(), lecture);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Lecture>, StoreError> {
        Ok(self.lectures.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, update: LectureUpdate) -> Result<bool, StoreError> {
        let mut lectures = self.lectures.write().await;
        let lecture = match lectures.get_mut(id) {
            Some(l) => l,
            None => return Ok(false),
        };

        if let Some(title) = update.title {
            lecture.title = title;
        }
        if let Some(subject) = update.subject {
            lecture.subject = subject;
        }
        if let Some(grade) = update.grade {
            lecture.grade = Some(grade);
        }
        if let Some(description) = update.description {
            lecture.description = Some(description);
        }
        if let Some(requirements) = update.requirements {
            lecture.requirements = requirements;
        }
        if let Some(content) = update.content {
            lecture.content = Some(content);
        }
        if let Some(status) = update.status {
            lecture.status = status;
        }
        lecture.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.lectures.write().await.remove(id).is_some())
    }

    async fn search(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Lecture>, StoreError> {
        let lectures = self.lectures.read().await;
        let mut hits: Vec<Lecture> = lectures
            .values()
            .filter(|l| user_id.is_none() || l.user_id.as_deref() == user_id)
            .filter(|l| {
                matches_query(
                    query,
                    &[
                        l.title.as_str(),
                        l.subject.as_str(),
                        l.description.as_deref().unwrap_or(""),
                    ],
                )
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list(
        &self,
        user_id: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Lecture>, usize), StoreError> {
        let lectures = self.lectures.read().await;
        let mut all: Vec<Lecture> = lectures
            .values()
            .filter(|l| user_id.is_none() || l.user_id.as_deref() == user_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len();
        let page = page.max(1);
        let items = all
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        Ok((items, total))
    }
}

/// 内存幻灯片存储
#[derive(Default)]
pub struct MemorySlideStore {
    decks: RwLock<HashMap<String, SlideDeck>>,
}

impl MemorySlideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlideStore for MemorySlideStore {
    async fn create(&self, deck: SlideDeck) -> Result<String, StoreError> {
        let id = deck.id.clone();
        self.decks.write().await.insert(id.clone(), deck);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<SlideDeck>, StoreError> {
        Ok(self.decks.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, update: SlideDeckUpdate) -> Result<bool, StoreError> {
        let mut decks = self.decks.write().await;
        let deck = match decks.get_mut(id) {
            Some(d) => d,
            None => return Ok(false),
        };

        if let Some(title) = update.title {
            deck.title = title;
        }
        if let Some(subject) = update.subject {
            deck.subject = subject;
        }
        if let Some(presentation_type) = update.presentation_type {
            deck.presentation_type = Some(presentation_type);
        }
        if let Some(duration) = update.duration {
            deck.duration = Some(duration);
        }
        if let Some(description) = update.description {
            deck.description = Some(description);
        }
        if let Some(requirements) = update.requirements {
            deck.requirements = requirements;
        }
        if let Some(slides) = update.slides {
            // 派生字段与内容一起更新
            deck.slide_count = slides.len();
            deck.slides = slides;
        }
        if let Some(status) = update.status {
            deck.status = status;
        }
        deck.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.decks.write().await.remove(id).is_some())
    }

    async fn search(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SlideDeck>, StoreError> {
        let decks = self.decks.read().await;
        let mut hits: Vec<SlideDeck> = decks
            .values()
            .filter(|d| user_id.is_none() || d.user_id.as_deref() == user_id)
            .filter(|d| {
                matches_query(
                    query,
                    &[
                        d.title.as_str(),
                        d.subject.as_str(),
                        d.description.as_deref().unwrap_or(""),
                    ],
                )
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list(
        &self,
        user_id: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<SlideDeck>, usize), StoreError> {
        let decks = self.decks.read().await;
        let mut all: Vec<SlideDeck> = decks
            .values()
            .filter(|d| user_id.is_none() || d.user_id.as_deref() == user_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len();
        let page = page.max(1);
        let items = all
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        Ok((items, total))
    }
}

/// 内存会话存储：会话表 + 按会话分桶的消息日志
#[derive(Default)]
pub struct MemoryChatStore {
    sessions: RwLock<HashMap<String, ChatSession>>,
    turns: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn create_session(&self, user_id: Option<&str>) -> Result<String, StoreError> {
        let session = ChatSession::new(user_id.map(String::from));
        let id = session.id.clone();
        self.sessions.write().await.insert(id.clone(), session);
        Ok(id)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn append_turn(&self, turn: ChatTurn) -> Result<String, StoreError> {
        let id = turn.id.clone();
        let session_id = turn.session_id.clone();

        self.turns
            .write()
            .await
            .entry(session_id.clone())
            .or_default()
            .push(turn);

        if let Some(session) = self.sessions.write().await.get_mut(&session_id) {
            session.updated_at = Utc::now();
        }
        Ok(id)
    }

    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StoreError> {
        let turns = self.turns.read().await;
        let all = match turns.get(session_id) {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }

    async fn sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        let sessions = self.sessions.read().await;
        let turns = self.turns.read().await;

        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .filter(|s| s.status == SessionStatus::Active)
            .map(|s| SessionSummary {
                session_id: s.id.clone(),
                title: s.title.clone(),
                created_at: s.created_at,
                updated_at: s.updated_at,
                message_count: turns.get(&s.id).map(|t| t.len()).unwrap_or(0),
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn set_title(&self, session_id: &str, title: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))?;
        session.title = title.to_string();
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.status == SessionStatus::Active => {
                session.status = SessionStatus::Deleted;
                session.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
