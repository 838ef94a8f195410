//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `EDUBOT__*` 覆盖
//! （双下划线表示嵌套，如 `EDUBOT__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub external: ExternalSection,
}

/// [app] 段：应用名与会话上下文轮数
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 传给分类器 / 聊天 prompt 的历史消息条数上限
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_history_turns() -> usize {
    10
}

/// [llm] 段：后端选择与各类调用的超时
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmSection {
    /// 后端：deepseek / openai；优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

/// [llm.timeouts] 段：生成调用远比分类 / 聊天调用慢，分开配置（秒）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_chat_timeout")]
    pub chat: u64,
    #[serde(default = "default_classify_timeout")]
    pub classify: u64,
    #[serde(default = "default_generation_timeout")]
    pub generation: u64,
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_classify_timeout() -> u64 {
    15
}

fn default_generation_timeout() -> u64 {
    60
}

/// [search] 段：搜索处理器每类制品返回的条数上限
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchSection {
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    3
}

/// [external] 段：外部资源助手（搜索 / 翻译 / 事实核查）的透传地址
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExternalSection {
    #[serde(default = "default_external_base_url")]
    pub base_url: String,
    #[serde(default = "default_external_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_external_base_url() -> String {
    "http://localhost:8002".to_string()
}

fn default_external_timeout_secs() -> u64 {
    15
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            search: SearchSection::default(),
            external: ExternalSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 EDUBOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 EDUBOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("EDUBOT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
