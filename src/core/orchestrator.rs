//! 会话编排器：一轮会话的主控
//!
//! 负责：会话引导（不存在则创建）、加载历史、落用户消息，
//! 然后按 分类 → 路由 → 处理 → 合成 跑完功能管线，最后落助手消息并返回回复。
//! 同一连续性键（user / session）上的轮次用 per-key 互斥锁串行；
//! 不同用户的轮次完全并行，彼此无共享可变状态。
//!
//! 传播策略：处理器自己消化自己的失败；到这里还在冒的错误属于意外，
//! 统一记日志并换成通用道歉，绝不把内部错误文本透给最终用户。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::core::router::{route, HandlerKind};
use crate::core::state::{HistoryTurn, TurnReply, TurnRequest, TurnState};
use crate::core::{compose, StoreError};
use crate::generation::GenerationPipeline;
use crate::handlers::{ChatHandler, LectureHandler, SearchHandler, SlideHandler};
use crate::intent::IntentClassifier;
use crate::llm::{
    create_deepseek_backend, CompletionBackend, CompletionGateway, MockBackend, OpenAiBackend,
};
use crate::models::{ChatTurn, Sender};
use crate::store::{ChatStore, LectureStore, SlideStore};

/// 意外失败时的通用道歉（不暴露内部错误文本）
pub const GENERIC_APOLOGY: &str =
    "Sorry, I ran into a technical problem. Please try again later.";

/// 会话标题取自首条消息的截断长度
const SESSION_TITLE_MAX_CHARS: usize = 50;

/// 根据配置与环境变量选择补全后端（DeepSeek / OpenAI 兼容 / Mock）
pub fn create_backend_from_config(cfg: &AppConfig) -> Arc<dyn CompletionBackend> {
    let provider = cfg.llm.provider.to_lowercase();
    // 有 DeepSeek Key 或（配置为 deepseek 且仅有 OpenAI Key 时也走 DeepSeek 兼容端点）
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .or_else(|| Some(cfg.llm.model.clone()))
            .unwrap_or_else(|| "deepseek-chat".to_string());
        tracing::info!("Using DeepSeek backend ({})", model);
        Arc::new(create_deepseek_backend(Some(&model)))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let base = cfg.llm.base_url.as_deref();
        tracing::info!("Using OpenAI backend ({})", model);
        Arc::new(OpenAiBackend::new(
            base,
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock backend");
        Arc::new(MockBackend::new())
    }
}

/// 会话编排器：持有分类器、四个处理器与会话存储
pub struct Orchestrator {
    classifier: IntentClassifier,
    chat: ChatHandler,
    lecture: LectureHandler,
    slide: SlideHandler,
    search: SearchHandler,
    pipeline: Arc<GenerationPipeline>,
    sessions: Arc<dyn ChatStore>,
    max_history_turns: usize,
    /// 连续性键 → 该键上的轮次锁
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        lectures: Arc<dyn LectureStore>,
        slides: Arc<dyn SlideStore>,
        sessions: Arc<dyn ChatStore>,
        cfg: &AppConfig,
    ) -> Self {
        let gateway = Arc::new(CompletionGateway::new(backend));
        let timeouts = &cfg.llm.timeouts;
        let pipeline = Arc::new(GenerationPipeline::new(
            gateway.clone(),
            lectures.clone(),
            slides.clone(),
            Duration::from_secs(timeouts.generation),
        ));

        Self {
            classifier: IntentClassifier::new(
                gateway.clone(),
                Duration::from_secs(timeouts.classify),
                cfg.app.max_history_turns,
            ),
            chat: ChatHandler::new(gateway.clone(), Duration::from_secs(timeouts.chat)),
            lecture: LectureHandler::new(pipeline.clone()),
            slide: SlideHandler::new(
                gateway,
                pipeline.clone(),
                Duration::from_secs(timeouts.chat),
            ),
            search: SearchHandler::new(lectures, slides, cfg.search.limit),
            pipeline,
            sessions,
            max_history_turns: cfg.app.max_history_turns,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 生成管线（kind 级生成入口，供会话之外的调用方直接使用）
    pub fn pipeline(&self) -> Arc<GenerationPipeline> {
        self.pipeline.clone()
    }

    /// 轮次处理入口：永不失败，最坏情况返回通用道歉
    pub async fn process(&self, request: TurnRequest) -> TurnReply {
        let key = request
            .user_id
            .clone()
            .or_else(|| request.session_id.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        let lock = {
            let mut locks = self.turn_locks.lock().await;
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;

        let session_id = match self.ensure_session(&request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Session bootstrap failed: {}", e);
                return TurnReply {
                    reply: GENERIC_APOLOGY.to_string(),
                    session_id: request.session_id.unwrap_or_default(),
                    metadata: serde_json::json!({"error": true}),
                };
            }
        };

        self.run_turn(request, session_id).await
    }

    /// 复用传入的会话；缺失或不存在时新建
    async fn ensure_session(&self, request: &TurnRequest) -> Result<String, StoreError> {
        if let Some(id) = &request.session_id {
            if self.sessions.get_session(id).await?.is_some() {
                return Ok(id.clone());
            }
            tracing::warn!("Unknown session {}, creating a new one", id);
        }
        self.sessions.create_session(request.user_id.as_deref()).await
    }

    async fn run_turn(&self, request: TurnRequest, session_id: String) -> TurnReply {
        let stored_history = match self
            .sessions
            .history(&session_id, self.max_history_turns)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!("History load failed, continuing without context: {}", e);
                Vec::new()
            }
        };
        let first_message = stored_history.is_empty();

        // 历史：调用方显式给了就用，否则取会话存储里的
        let history: Vec<HistoryTurn> = if request.history.is_empty() {
            stored_history
                .iter()
                .map(|t| HistoryTurn {
                    sender: match t.sender {
                        Sender::User => "user".to_string(),
                        Sender::Assistant => "assistant".to_string(),
                    },
                    content: t.content.clone(),
                })
                .collect()
        } else {
            request.history.clone()
        };

        // 先落用户消息；落不下去说明存储不可用，直接道歉
        if let Err(e) = self
            .sessions
            .append_turn(ChatTurn::new(&session_id, &request.message, Sender::User))
            .await
        {
            tracing::error!("Failed to persist user turn: {}", e);
            return TurnReply {
                reply: GENERIC_APOLOGY.to_string(),
                session_id,
                metadata: serde_json::json!({"error": true}),
            };
        }

        // 首条消息的前缀作为会话标题
        if first_message {
            let title = truncate_title(&request.message);
            if let Err(e) = self.sessions.set_title(&session_id, &title).await {
                tracing::warn!("Failed to set session title: {}", e);
            }
        }

        // 功能管线：每个阶段消费旧状态、返回新状态
        let state = TurnState::new(&request.message, history, request.user_id.clone());
        let state = self.classifier.classify(state).await;
        let state = match route(state.intent) {
            HandlerKind::Chat => self.chat.handle(state).await,
            HandlerKind::CreateLecture => self.lecture.handle(state).await,
            HandlerKind::CreateSlide => self.slide.handle(state).await,
            HandlerKind::Search => self.search.handle(state).await,
        };
        let state = compose::finalize(state);

        let reply = state
            .response
            .clone()
            .unwrap_or_else(|| compose::CLARIFY_REPLY.to_string());
        let metadata = state.metadata_value();

        // 落助手消息；回复已经生成，这里失败只记日志
        let turn = ChatTurn::new(&session_id, &reply, Sender::Assistant)
            .with_metadata(metadata.clone());
        if let Err(e) = self.sessions.append_turn(turn).await {
            tracing::error!("Failed to persist assistant turn: {}", e);
        }

        TurnReply {
            reply,
            session_id,
            metadata,
        }
    }
}

fn truncate_title(message: &str) -> String {
    if message.chars().count() > SESSION_TITLE_MAX_CHARS {
        let prefix: String = message.chars().take(SESSION_TITLE_MAX_CHARS).collect();
        format!("{}...", prefix)
    } else {
        message.to_string()
    }
}
