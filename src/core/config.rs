use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ScoutConfig: file-based config loader (resort-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "RESORT_SCOUT_CONFIG";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 8;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("extraction service API key not found: set `extraction.api_key` in resort-scout.json or the GEMINI_API_KEY environment variable")]
    MissingApiKey,
}

/// Extraction-service sub-config (the `extraction` key in resort-scout.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ExtractionConfig {
    /// API key. Never logged.
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint root, without the `/chat/completions` suffix.
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Ask the service for schema-constrained JSON instead of free text.
    pub structured_output: Option<bool>,
    /// Unset means the call waits for the service as long as it takes.
    pub request_timeout_secs: Option<u64>,
    /// Prior prompt/reply pairs kept in the conversational context.
    pub max_history_turns: Option<usize>,
}

impl ExtractionConfig {
    /// API key: JSON field → `GEMINI_API_KEY` env var → error.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_from(env_string)
    }

    /// Same lookup with the environment supplied by the caller.
    pub fn resolve_api_key_from(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        non_empty(&self.api_key)
            .or_else(|| env(ENV_API_KEY).map(|k| k.trim().to_string()).filter(|k| !k.is_empty()))
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Base URL: JSON field → `EXTRACTION_BASE_URL` env var → provider default.
    pub fn resolve_base_url(&self) -> String {
        non_empty(&self.base_url)
            .or_else(|| env_string("EXTRACTION_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Model name: JSON field → `EXTRACTION_MODEL` env var → `gemini-2.0-flash`.
    pub fn resolve_model(&self) -> String {
        non_empty(&self.model)
            .or_else(|| env_string("EXTRACTION_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// JSON field → `EXTRACTION_STRUCTURED_OUTPUT` ("0"/"false"/"off" disables) → `true`.
    pub fn resolve_structured_output(&self) -> bool {
        if let Some(b) = self.structured_output {
            return b;
        }
        match env_string("EXTRACTION_STRUCTURED_OUTPUT") {
            Some(v) => !matches!(
                v.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
            None => true,
        }
    }

    pub fn resolve_request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .or_else(|| env_parse("EXTRACTION_TIMEOUT_SECS"))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn resolve_max_history_turns(&self) -> usize {
        self.max_history_turns
            .or_else(|| env_parse("EXTRACTION_MAX_HISTORY_TURNS"))
            .unwrap_or(DEFAULT_MAX_HISTORY_TURNS)
    }
}

/// Page-fetch sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct FetchConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl FetchConfig {
    /// JSON field → `FETCH_TIMEOUT_SECS` env var → 10 seconds.
    pub fn resolve_timeout(&self) -> Duration {
        let secs = self
            .timeout_secs
            .or_else(|| env_parse("FETCH_TIMEOUT_SECS"))
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn resolve_user_agent(&self) -> String {
        non_empty(&self.user_agent).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }
}

#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SessionConfig {
    pub idle_timeout_secs: Option<u64>,
}

impl SessionConfig {
    /// JSON field → `SESSION_IDLE_TIMEOUT_SECS` env var → 30 minutes.
    pub fn resolve_idle_timeout(&self) -> Duration {
        let secs = self
            .idle_timeout_secs
            .or_else(|| env_parse("SESSION_IDLE_TIMEOUT_SECS"))
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);
        Duration::from_secs(secs.max(1))
    }
}

#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

/// Top-level config loaded from `resort-scout.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct ScoutConfig {
    pub extraction: ExtractionConfig,
    pub fetch: FetchConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

impl ScoutConfig {
    /// Checks everything the server cannot run without. Called once before binding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(env_string)
    }

    pub fn validate_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        self.extraction.resolve_api_key_from(env).map(|_| ())
    }

    /// Port: `RESORT_SCOUT_PORT` / `PORT` env → JSON `server.port` → 8080.
    /// The `--port` CLI flag is handled in `main` and wins over all of these.
    pub fn resolve_port(&self) -> u16 {
        for k in ["RESORT_SCOUT_PORT", "PORT"] {
            if let Some(p) = env_parse::<u16>(k) {
                return p;
            }
        }
        self.server.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Load `resort-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `RESORT_SCOUT_CONFIG` env var path
/// 2. `./resort-scout.json`
/// 3. `../resort-scout.json`
/// 4. `<config dir>/resort-scout/config.json`
///
/// Missing file → `ScoutConfig::default()` (all env-var fallbacks apply).
/// Parse error → log a warning, return `ScoutConfig::default()`.
pub fn load_scout_config() -> ScoutConfig {
    for path in &config_candidates() {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match serde_json::from_str::<ScoutConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("resort-scout config loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "resort-scout config parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                ScoutConfig::default()
            }
        };
    }

    ScoutConfig::default()
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![
        PathBuf::from("resort-scout.json"),
        PathBuf::from("../resort-scout.json"),
    ];
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        v.insert(0, PathBuf::from(env_path));
    }
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("resort-scout").join("config.json"));
    }
    v
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
