//! Entilens Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for local use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Entity recognition backends
    pub ner: NerConfig,

    /// OCR fallback for scanned PDFs
    pub ocr: OcrConfig,

    /// In-memory session history
    pub sessions: SessionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_override()
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "API_PORT")? {
            self.server.port = port;
        }
        if let Some(size) = parse_var(&lookup, "MAX_BODY_SIZE")? {
            self.server.max_body_size = size;
        }
        // CORS origins from environment variable (comma-separated)
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins);
        }

        // NER
        if let Some(url) = lookup("NER_SERVICE_URL") {
            self.ner.service_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(model) = lookup("NER_DEFAULT_MODEL") {
            self.ner.default_model = model;
        }
        if let Some(models) = lookup("NER_MODELS") {
            self.ner.models = split_list(&models);
        }
        if let Some(timeout) = parse_var(&lookup, "NER_TIMEOUT_SECS")? {
            self.ner.timeout_secs = timeout;
        }

        // OCR
        if let Some(enabled) = parse_bool_var(&lookup, "OCR_ENABLED")? {
            self.ocr.enabled = enabled;
        }
        if let Some(language) = lookup("OCR_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(path) = lookup("TESSERACT_PATH") {
            self.ocr.tesseract_path = Some(path);
        }
        if let Some(path) = lookup("PDFTOPPM_PATH") {
            self.ocr.pdftoppm_path = Some(path);
        }
        if let Some(dpi) = parse_var(&lookup, "OCR_DPI")? {
            self.ocr.dpi = dpi;
        }

        // Sessions
        if let Some(max) = parse_var::<usize, _>(&lookup, "MAX_SESSIONS")? {
            self.sessions.max_sessions = if max == 0 { None } else { Some(max) };
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_bool_var(&lookup, "LOG_JSON")? {
            self.logging.json_format = json;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ner.default_model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ner.default_model".to_string()));
        }
        if self.ocr.dpi == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ocr.dpi".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

fn parse_bool_var<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        },
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 300,
            max_body_size: 20 * 1024 * 1024, // 20MB
            cors_enabled: true,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Entity recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Base URL of a spaCy-compatible NER service
    pub service_url: Option<String>,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Models served by the NER service
    pub models: Vec<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            default_model: "builtin".to_string(),
            models: vec!["en_core_web_sm".to_string(), "en_core_web_trf".to_string()],
            timeout_secs: 60,
        }
    }
}

/// OCR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR when a PDF has no text layer
    pub enabled: bool,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    pub language: String,

    /// Path to the tesseract executable
    pub tesseract_path: Option<String>,

    /// Path to the pdftoppm executable
    pub pdftoppm_path: Option<String>,

    /// Rasterization resolution
    pub dpi: u32,

    /// Tesseract page segmentation mode
    pub psm: Option<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "eng".to_string(),
            tesseract_path: None,
            pdftoppm_path: None,
            dpi: 300,
            psm: None,
        }
    }
}

/// Session history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keep at most this many snapshots; `None` keeps all
    pub max_sessions: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
