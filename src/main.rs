//! EduBot - Rust 教学助理智能体
//!
//! 入口：初始化日志、装配存储与编排器，跑一个最小的 stdin 会话循环。

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edubot::config::{load_config, AppConfig};
use edubot::core::{create_backend_from_config, Orchestrator};
use edubot::store::{MemoryChatStore, MemoryLectureStore, MemorySlideStore};
use edubot::TurnRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let backend = create_backend_from_config(&cfg);
    let orchestrator = Orchestrator::new(
        backend,
        Arc::new(MemoryLectureStore::new()),
        Arc::new(MemorySlideStore::new()),
        Arc::new(MemoryChatStore::new()),
        &cfg,
    );

    println!("EduBot ready. Ask for a lecture or slides; type 'quit' to exit.");

    let stdin = std::io::stdin();
    let mut session_id: Option<String> = None;
    loop {
        print!("you> ");
        std::io::stdout().flush().context("stdout flush failed")?;

        let mut line = String::new();
        if stdin.read_line(&mut line).context("stdin read failed")? == 0 {
            break; // EOF
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "quit" | "exit") {
            break;
        }

        let reply = orchestrator
            .process(TurnRequest {
                message: message.to_string(),
                history: vec![],
                user_id: Some("local".to_string()),
                session_id: session_id.clone(),
            })
            .await;
        session_id = Some(reply.session_id.clone());

        println!("edubot> {}", reply.reply);
    }

    Ok(())
}
