//! TOML-based configuration for ragqa
//!
//! This module provides declarative configuration for the server, the hosted
//! model, the retrieval pipeline, the tools and the tool router via a TOML
//! file (`ragqa.toml`).
//!
//! Secrets are never stored in the file. The API key is referenced by the name
//! of the environment variable that holds it (`llm.api_key_env`), and is only
//! consulted when a request does not carry its own key.
//!
//! Use `ConfigManager` for thread-safe access to the current configuration.
//! `ConfigManager::start_watching` reloads it whenever the file changes.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::agents::router::RoutingPolicy;
use crate::rag::store::IndexPolicy;

/// Root configuration structure loaded from ragqa.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagqaConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub router: RouterConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` for human-readable output, `json` for structured logs
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            body_limit: default_body_limit(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Environment variable consulted when a request carries no API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Timeout for every outbound HTTP call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo-0125".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: 0.0,
            api_key_env: default_api_key_env(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Run the tool calls of one model turn concurrently
    #[serde(default = "default_true")]
    pub parallel_tools: bool,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant".to_string()
}

fn default_max_iterations() -> usize {
    15
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
            parallel_tools: true,
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// The single page indexed for document search
    #[serde(default = "default_source_url")]
    pub source_url: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks returned per retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub index_policy: IndexPolicy,

    /// Number of indices kept when `index_policy = "cached"`
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Inputs per embeddings request
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
}

fn default_source_url() -> String {
    "https://docs.smith.langchain.com/".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_cache_capacity() -> usize {
    4
}

fn default_embedding_batch_size() -> usize {
    256
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            index_policy: IndexPolicy::default(),
            cache_capacity: default_cache_capacity(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    #[serde(default)]
    pub document_search: DocumentSearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki action API endpoint
    #[serde(default = "default_wikipedia_api_url")]
    pub api_url: String,

    #[serde(default = "default_top_k_results")]
    pub top_k_results: usize,

    #[serde(default = "default_doc_content_chars_max")]
    pub doc_content_chars_max: usize,
}

fn default_wikipedia_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_top_k_results() -> usize {
    1
}

fn default_doc_content_chars_max() -> usize {
    200
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_api_url(),
            top_k_results: default_top_k_results(),
            doc_content_chars_max: default_doc_content_chars_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchConfig {
    #[serde(default = "default_document_tool_name")]
    pub name: String,

    #[serde(default = "default_document_tool_description")]
    pub description: String,
}

fn default_document_tool_name() -> String {
    "Langsmith_search".to_string()
}

fn default_document_tool_description() -> String {
    "Search for information about Langsmith.For any questions about Langsmith you must use this tool"
        .to_string()
}

impl Default for DocumentSearchConfig {
    fn default() -> Self {
        Self {
            name: default_document_tool_name(),
            description: default_document_tool_description(),
        }
    }
}

// ============= Router Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub policy: RoutingPolicy,

    /// Substring (matched case-insensitively) that attributes a query to document search
    #[serde(default = "default_document_keyword")]
    pub document_keyword: String,
}

fn default_document_keyword() -> String {
    "langsmith".to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            policy: RoutingPolicy::default(),
            document_keyword: default_document_keyword(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Config(err.to_string())
    }
}

impl RagqaConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RagqaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "rag.top_k must be greater than zero".to_string(),
            ));
        }
        if self.rag.cache_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "rag.cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.rag.embedding_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.tools.wikipedia.top_k_results == 0 {
            return Err(ConfigError::ValidationError(
                "tools.wikipedia.top_k_results must be greater than zero".to_string(),
            ));
        }
        if self.router.document_keyword.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "router.document_keyword must not be empty".to_string(),
            ));
        }
        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }
        Ok(())
    }

    /// API key from the configured environment variable, if set and non-empty
    pub fn env_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Quiet period after a file event before the config is read again.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Thread-safe configuration holder with lock-free reads and hot reloading
pub struct ConfigManager {
    config: Arc<ArcSwap<RagqaConfig>>,
    config_path: Option<PathBuf>,
    watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path so reloads survive a changed working directory
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = RagqaConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
            watcher: None,
        })
    }

    /// Wrap an in-memory configuration (no backing file)
    pub fn from_config(config: RagqaConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
            watcher: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<RagqaConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reload the configuration from disk. A no-op for in-memory configs.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };

        info!("Reloading configuration from {:?}", path);
        reload_into(path, &self.config)?;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Reload whenever the backing file is written. Must be called inside a
    /// Tokio runtime. A no-op for in-memory configs.
    ///
    /// A file that no longer loads is logged and the previous configuration
    /// stays in place. Watching stops when the manager is dropped.
    pub fn start_watching(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.config_path.clone() else {
            return Ok(());
        };
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let file_name = path.file_name().map(|name| name.to_os_string());
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // The receiver only goes away at shutdown
                        tx.send(()).ok();
                    }
                }
                Err(e) => error!("Config watcher error: {:?}", e),
            }
        })?;

        // Editors often replace the file, so watch its directory
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);

        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(RELOAD_DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                match reload_into(&path, &config) {
                    Ok(()) => info!("Configuration hot-reloaded from {:?}", path),
                    Err(e) => warn!(
                        "Failed to hot-reload config: {}. Keeping previous config.",
                        e
                    ),
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

fn reload_into(path: &Path, config: &ArcSwap<RagqaConfig>) -> Result<(), ConfigError> {
    let new_config = RagqaConfig::load(path)?;
    config.store(Arc::new(new_config));
    Ok(())
}

impl Clone for ConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
            // Watcher is not cloned
            watcher: None,
        }
    }
}
