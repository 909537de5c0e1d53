use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::TranslateError;
use crate::language::LanguageConfig;

const DEFAULT_DOUBLE_COPY_GAP_SECS: f64 = 0.30;

/// Where chat completion requests go: a local LM Studio style server or a remote API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Offline,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OfflineConfig {
    pub port: u16,
    pub path: String,
    pub model: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            port: 1234,
            path: "/v1/chat/completions".to_string(),
            model: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OnlineConfig {
    /// Full chat completions URL, e.g. `https://api.openai.com/v1/chat/completions`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Model parameters copied into every request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub tool_choice: String,
    pub enable_thinking: bool,
    /// Provider specific flags merged verbatim into the request body.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 1024,
            tool_choice: "none".to_string(),
            enable_thinking: false,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Candidate languages, the user's native language first.
    pub language_codes: Vec<String>,
    /// Per-language regex matching one character of that language's script.
    pub language_detection_regexes: HashMap<String, String>,
    pub mode: ConnectionMode,
    pub offline: OfflineConfig,
    pub online: OnlineConfig,
    pub double_copy_gap_seconds: f64,
    pub poll_interval_ms: u64,
    pub request_body: RequestParams,
    pub request_timeout_secs: u64,
    /// Only read by presenters.
    pub max_line_length: Option<usize>,
    pub few_shot_examples_path: Option<PathBuf>,
    pub discard_stale_results: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language_codes: vec!["en".to_string(), "ru".to_string()],
            language_detection_regexes: HashMap::new(),
            mode: ConnectionMode::Offline,
            offline: OfflineConfig::default(),
            online: OnlineConfig::default(),
            double_copy_gap_seconds: DEFAULT_DOUBLE_COPY_GAP_SECS,
            poll_interval_ms: 50,
            request_body: RequestParams::default(),
            request_timeout_secs: 30,
            max_line_length: None,
            few_shot_examples_path: None,
            discard_stale_results: false,
        }
    }
}

/// Concrete target for chat completion requests, resolved once from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Config {
    /// `config.json` next to the executable unless `LLMTRANS_CONFIG` says otherwise.
    pub fn path() -> PathBuf {
        if let Ok(p) = std::env::var("LLMTRANS_CONFIG") {
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg = serde_json::from_str::<Config>(&s)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Loads the config file, falling back to defaults, then applies env overrides.
    pub fn load() -> Self {
        let path = Self::path();
        let mut cfg = if path.exists() {
            match Self::load_from(&path) {
                Ok(cfg) => {
                    info!("Config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("{:#}; using defaults", e);
                    Self::default()
                }
            }
        } else {
            info!("No config at {}; using defaults", path.display());
            Self::default()
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg
    }

    /// Env vars win over the file when set and non-empty.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("OPENAI_API_KEY") {
            self.online.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.online.model = Some(v);
        }
        if let Some(v) = get("LLMTRANS_BASE_URL") {
            self.online.base_url = v;
            self.mode = ConnectionMode::Online;
        }
    }

    pub fn endpoint(&self) -> Result<Endpoint, TranslateError> {
        match self.mode {
            ConnectionMode::Offline => {
                let path = if self.offline.path.starts_with('/') {
                    self.offline.path.clone()
                } else {
                    format!("/{}", self.offline.path)
                };
                let raw = format!("http://127.0.0.1:{}{}", self.offline.port, path);
                let url = Url::parse(&raw).map_err(|e| {
                    TranslateError::Configuration(format!("invalid offline endpoint {}: {}", raw, e))
                })?;
                let model = Some(self.offline.model.trim().to_string()).filter(|m| !m.is_empty());
                Ok(Endpoint { url, api_key: None, model })
            }
            ConnectionMode::Online => {
                let raw = self.online.base_url.trim();
                if raw.is_empty() {
                    return Err(TranslateError::Configuration(
                        "online mode requires a non-empty base_url".to_string(),
                    ));
                }
                let url = Url::parse(raw).map_err(|e| {
                    TranslateError::Configuration(format!("invalid base_url {:?}: {}", raw, e))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(TranslateError::Configuration(format!(
                        "base_url must be http or https, got {}",
                        url.scheme()
                    )));
                }
                Ok(Endpoint {
                    url,
                    api_key: non_empty(&self.online.api_key),
                    model: non_empty(&self.online.model),
                })
            }
        }
    }

    pub fn language_config(&self) -> LanguageConfig {
        LanguageConfig {
            codes: self.language_codes.clone(),
            patterns: self.language_detection_regexes.clone(),
        }
    }

    /// Negative values mean zero; values too large for a `Duration` fall back to the default.
    pub fn double_copy_gap(&self) -> Duration {
        Duration::try_from_secs_f64(self.double_copy_gap_seconds.max(0.0)).unwrap_or_else(|e| {
            warn!(
                "double_copy_gap_seconds {} is unusable ({}); using {}s",
                self.double_copy_gap_seconds, e, DEFAULT_DOUBLE_COPY_GAP_SECS
            );
            Duration::from_secs_f64(DEFAULT_DOUBLE_COPY_GAP_SECS)
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
