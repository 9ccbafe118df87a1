//! Environment-driven application settings.
//!
//! Built once at process start and passed by reference through the service
//! container; nothing here is a global.

use llm::{LlmConfig, LlmProvider};
use sandbox::{RemoteStorageConfig, SandboxConfig};
use std::time::Duration;
use tooling::config::{get_env_bool, get_env_or, get_env_parse_or};
use tooling::{Result, ToolingError};

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Log filter, e.g. `info` or `orchestrator=debug`.
    pub log_level: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Static API key; an empty value disables authentication.
    pub api_key: String,

    /// Upload size cap in megabytes.
    pub max_file_size_mb: usize,
    /// Step-attempt budget per step goal.
    pub max_step_retries: u32,
    /// Generation-attempt budget per step.
    pub max_code_retries: u32,
    /// Hard cap on node visits per task.
    pub max_graph_steps: u32,
    /// Character budget for captured execution output.
    pub max_output_chars: usize,
    /// Head share of the truncation split.
    pub output_split_ratio: f64,

    /// Registry sweep interval.
    pub cleanup_interval_seconds: u64,
    /// Registry record expiry.
    pub expiry_seconds: u64,

    /// Model for the planning node.
    pub planning_llm: LlmConfig,
    /// Model for the code planning node.
    pub code_planning_llm: LlmConfig,
    /// Model for the code generation node.
    pub code_generation_llm: LlmConfig,
    /// Model for the answering node.
    pub answering_llm: LlmConfig,
    /// Model for the remaining nodes.
    pub default_llm: LlmConfig,

    /// Sandbox provider configuration.
    pub sandbox: SandboxConfig,
    /// Filename the rendered notebook is saved under.
    pub notebook_filename: String,
    /// Whether artifacts go to the remote store instead of inline content.
    pub file_storage_enabled: bool,
    /// Remote-store base path for task artifacts.
    pub storage_base_path: String,
}

impl Settings {
    /// Load settings from the environment, applying defaults.
    pub fn from_env() -> Result<Self> {
        let file_storage_enabled = get_env_bool("FILE_STORAGE_ENABLED")?.unwrap_or(false);

        let mut sandbox = SandboxConfig::new(
            get_env_or("SANDBOX_API_URL", "http://localhost:49982")?,
            get_env_or("SANDBOX_API_KEY", "")?,
        )
        .with_template(get_env_or("SANDBOX_TEMPLATE", "python-data-science")?)
        .with_timeout_seconds(get_env_parse_or("SANDBOX_DEFAULT_TIMEOUT_SECONDS", 2400u64)?)
        .with_working_directory(get_env_or("DEFAULT_WORKING_DIRECTORY", "/home/user")?)
        .with_data_directory(get_env_or("DEFAULT_DATA_DIRECTORY", "/home/user/data")?);

        if file_storage_enabled {
            sandbox = sandbox.with_remote_storage(RemoteStorageConfig {
                bucket: get_env_or("STORAGE_BUCKET", "")?,
                endpoint: tooling::config::get_env("STORAGE_ENDPOINT")?,
                access_key_id: get_env_or("STORAGE_ACCESS_KEY_ID", "")?,
                secret_access_key: get_env_or("STORAGE_SECRET_ACCESS_KEY", "")?,
            });
        }

        Ok(Self {
            log_level: get_env_or("LOG_LEVEL", "info")?,
            host: get_env_or("HOST", "0.0.0.0")?,
            port: get_env_parse_or("PORT", 8000u16)?,
            api_key: get_env_or("API_KEY", "")?,
            max_file_size_mb: get_env_parse_or("MAX_FILE_SIZE_MB", 50usize)?,
            max_step_retries: get_env_parse_or("CODE_PLANNING_MAX_STEP_RETRIES", 3u32)?,
            max_code_retries: get_env_parse_or("CODE_GENERATION_MAX_RETRIES", 5u32)?,
            max_graph_steps: get_env_parse_or("MAX_GRAPH_STEPS", 250u32)?,
            max_output_chars: get_env_parse_or("MAX_OUTPUT_CHARS", 25_000usize)?,
            output_split_ratio: get_env_parse_or("OUTPUT_SPLIT_RATIO", 0.6f64)?,
            cleanup_interval_seconds: get_env_parse_or("TASK_CLEANUP_INTERVAL_SECONDS", 60u64)?,
            expiry_seconds: get_env_parse_or("TASK_EXPIRY_SECONDS", 300u64)?,
            planning_llm: node_llm("PLANNING")?,
            code_planning_llm: node_llm("CODE_PLANNING")?,
            code_generation_llm: node_llm("CODE_GENERATION")?,
            answering_llm: node_llm("ANSWERING")?,
            default_llm: node_llm("DEFAULT")?,
            sandbox,
            notebook_filename: get_env_or("NOTEBOOK_FILENAME", "task_notebook.ipynb")?,
            file_storage_enabled,
            storage_base_path: get_env_or("STORAGE_BASE_PATH", "")?,
        })
    }

    /// Upload size cap in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Registry sweep interval as a duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    /// Registry record expiry as a duration.
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_seconds)
    }

    /// Engine limits derived from these settings.
    pub fn engine_config(&self) -> agent::EngineConfig {
        agent::EngineConfig {
            max_graph_steps: self.max_graph_steps,
            max_step_retries: self.max_step_retries,
            max_code_retries: self.max_code_retries,
            max_output_chars: self.max_output_chars,
            output_split_ratio: self.output_split_ratio,
            working_directory: self.sandbox.working_directory.clone(),
            notebook_filename: self.notebook_filename.clone(),
        }
    }

    /// Build the per-node LLM clients.
    pub fn node_models(&self) -> llm::Result<agent::NodeModels<llm::LlmClient>> {
        Ok(agent::NodeModels {
            planning: llm::LlmClient::from_config(self.planning_llm.clone())?,
            code_planning: llm::LlmClient::from_config(self.code_planning_llm.clone())?,
            code_generation: llm::LlmClient::from_config(self.code_generation_llm.clone())?,
            answering: llm::LlmClient::from_config(self.answering_llm.clone())?,
            default_model: llm::LlmClient::from_config(self.default_llm.clone())?,
        })
    }
}

/// Model configuration for one workflow node, falling back to the DEFAULT
/// node settings for anything unset.
fn node_llm(node: &str) -> Result<LlmConfig> {
    let provider_name = env_with_fallback(
        &format!("{}_LLM_PROVIDER", node),
        "DEFAULT_LLM_PROVIDER",
        "openai",
    )?;
    let provider = LlmProvider::parse(&provider_name).ok_or_else(|| {
        ToolingError::General(format!(
            "Unsupported LLM provider for {}: {}",
            node, provider_name
        ))
    })?;

    let model = env_with_fallback(&format!("{}_LLM_MODEL", node), "DEFAULT_LLM_MODEL", "gpt-5")?;
    let max_tokens: usize = env_with_fallback(
        &format!("{}_LLM_MAX_TOKENS", node),
        "DEFAULT_LLM_MAX_TOKENS",
        "8192",
    )?
    .parse()
    .map_err(|e| ToolingError::General(format!("Invalid max_tokens for {}: {}", node, e)))?;

    let (key_var, base_url_var) = match provider {
        LlmProvider::OpenAi => ("OPENAI_API_KEY", "OPENAI_BASE_URL"),
        LlmProvider::Anthropic => ("ANTHROPIC_API_KEY", "ANTHROPIC_BASE_URL"),
    };

    let mut config = LlmConfig::new(provider, model, get_env_or(key_var, "")?)
        .with_max_tokens(max_tokens);
    if let Some(base_url) = tooling::config::get_env(base_url_var)? {
        config = config.with_base_url(base_url);
    }
    Ok(config)
}

fn env_with_fallback(primary: &str, fallback: &str, default: &str) -> Result<String> {
    match tooling::config::get_env(primary)? {
        Some(value) => Ok(value),
        None => get_env_or(fallback, default),
    }
}
