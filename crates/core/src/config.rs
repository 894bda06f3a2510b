//! Configuration management for the support copilot.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.copilot/config.yaml`, or `COPILOT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric; corpora and prompt overrides live
//! under `.copilot/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".copilot";

/// Default number of KB chunks retrieved per attempt.
pub const DEFAULT_KB_K: u32 = 5;

/// Default number of ticket chunks retrieved per attempt.
pub const DEFAULT_TICKETS_K: u32 = 3;

/// Default provider request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .copilot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("ollama", "openai")
    pub provider: String,

    /// Model used to generate answers
    pub model: String,

    /// Model used by the judge; falls back to `model`
    pub judge_model: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Retrieval breadth and corpus locations
    pub retrieval: RetrievalConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "judgeModel")]
        judge_model: Option<String>,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "judgeModel")]
        judge_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }

    fn judge_model(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { judge_model, .. }
            | ProviderConfig::Ollama { judge_model, .. } => judge_model.as_deref(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// KB chunks per retrieval
    #[serde(rename = "kbK", default = "default_kb_k")]
    pub kb_k: u32,

    /// Ticket chunks per retrieval
    #[serde(rename = "ticketsK", default = "default_tickets_k")]
    pub tickets_k: u32,

    /// KB corpus JSONL file (relative paths resolve against the workspace)
    #[serde(rename = "kbCorpus", default)]
    pub kb_corpus: Option<PathBuf>,

    /// Ticket corpus JSONL file (relative paths resolve against the workspace)
    #[serde(rename = "ticketsCorpus", default)]
    pub tickets_corpus: Option<PathBuf>,
}

fn default_kb_k() -> u32 {
    DEFAULT_KB_K
}

fn default_tickets_k() -> u32 {
    DEFAULT_TICKETS_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            kb_k: DEFAULT_KB_K,
            tickets_k: DEFAULT_TICKETS_K,
            kb_corpus: None,
            tickets_corpus: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            judge_model: None,
            api_key: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `COPILOT_WORKSPACE`: Override workspace path
    /// - `COPILOT_CONFIG`: Path to config file
    /// - `COPILOT_PROVIDER`: LLM provider
    /// - `COPILOT_MODEL`: Generation model
    /// - `COPILOT_JUDGE_MODEL`: Judge model
    /// - `COPILOT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use copilot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// `workspace` and `config_file` take precedence over `COPILOT_WORKSPACE`
    /// and `COPILOT_CONFIG`; the YAML file is then read from the resolved
    /// location before environment variables are applied.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("COPILOT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("COPILOT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        match config.config_file.clone() {
            Some(path) if !path.exists() => {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            Some(path) => config = config.merge_yaml(&path)?,
            None => {
                let default_path = config.state_dir().join("config.yaml");
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("COPILOT_PROVIDER") {
            config.select_provider(provider);
        }

        if let Ok(model) = std::env::var("COPILOT_MODEL") {
            config.model = model;
        }

        if let Ok(judge_model) = std::env::var("COPILOT_JUDGE_MODEL") {
            config.judge_model = Some(judge_model);
        }

        config.api_key = std::env::var("COPILOT_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
                result.judge_model = provider_config.judge_model().map(str::to_string);
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.select_provider(provider);
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Switch the active provider, taking the models from its config block
    /// when one exists.
    fn select_provider(&mut self, provider: String) {
        if provider != self.provider {
            if let Some((model, judge_model)) = self
                .get_provider_config(&provider)
                .map(|block| (block.model().to_string(), block.judge_model().map(str::to_string)))
            {
                self.model = model;
                self.judge_model = judge_model;
            }
        }
        self.provider = provider;
    }

    /// Get the path to the .copilot directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .copilot directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Model used by the judge.
    pub fn effective_judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.model)
    }

    /// Resolved location of the KB corpus file.
    pub fn kb_corpus_path(&self) -> PathBuf {
        self.resolve_corpus(self.retrieval.kb_corpus.as_deref(), "kb.jsonl")
    }

    /// Resolved location of the ticket corpus file.
    pub fn tickets_corpus_path(&self) -> PathBuf {
        self.resolve_corpus(self.retrieval.tickets_corpus.as_deref(), "tickets.jsonl")
    }

    fn resolve_corpus(&self, configured: Option<&Path>, default_name: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.workspace.join(path),
            None => self.state_dir().join("corpora").join(default_name),
        }
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Custom endpoint configured for a provider, if any.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        match self.get_provider_config(provider)? {
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.clone()),
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.clone(),
        }
    }

    /// Request timeout for a provider, in seconds.
    pub fn provider_timeout_secs(&self, provider: &str) -> u64 {
        match self.get_provider_config(provider) {
            Some(ProviderConfig::Ollama { timeout, .. })
            | Some(ProviderConfig::OpenAI { timeout, .. }) => {
                timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
            }
            None => DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Resolve the API key: explicit `COPILOT_API_KEY` first, then the provider's env var.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
            Some(ProviderConfig::Ollama { .. }) => return None,
            None if provider == "openai" => "OPENAI_API_KEY".to_string(),
            None => return None,
        };

        std::env::var(env_var).ok()
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.retrieval.kb_k == 0 || self.retrieval.tickets_k == 0 {
            return Err(AppError::Config(
                "Retrieval breadth (kbK, ticketsK) must be greater than zero".to_string(),
            ));
        }

        if self.provider == "openai" && self.resolve_api_key("openai").is_none() {
            let env_var = match self.get_provider_config("openai") {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.as_str(),
                _ => "OPENAI_API_KEY",
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        Ok(())
    }
}
