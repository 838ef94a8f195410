//! Agent 错误类型
//!
//! 只建模需要向上传播的失败（上游超时 / 不可达、存储故障、引用缺失）。
//! 分类失败与结构化提取降级不是错误：它们在各自模块内兜底并记日志。

use thiserror::Error;

/// 一次会话轮次或生成请求中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 补全后端超出时间预算；调用方提示用户稍后重试，不自动重试
    #[error("Completion backend timed out")]
    UpstreamTimeout,

    #[error("Completion backend unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 引用的制品 / 会话不存在；显式上抛，绝不静默兜底
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// 持久化协作方的错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store backend failure: {0}")]
    Backend(String),
}
