//! 核心编排层：错误、轮次状态、路由、合成与主控编排器

pub mod compose;
pub mod error;
pub mod orchestrator;
pub mod router;
pub mod state;

pub use error::{AgentError, StoreError};
pub use orchestrator::{create_backend_from_config, Orchestrator, GENERIC_APOLOGY};
pub use router::{route, HandlerKind};
pub use state::{HistoryTurn, TurnReply, TurnRequest, TurnState};
