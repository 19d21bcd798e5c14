use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language transcripts are assumed to be in (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language to translate into (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// SQLite database file; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,

    /// Translator settings
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Speech recognition settings
    #[serde(default)]
    pub whisper: WhisperConfig,

    /// Metadata fetcher settings
    #[serde(default)]
    pub ytdlp: YtDlpConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How the translator binary is driven
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorMode {
    /// One short-lived process per translate call
    Simple,
    /// A long-lived server keeps the model loaded between calls
    #[default]
    Server,
}

impl std::fmt::Display for TranslatorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Server => write!(f, "server"),
        }
    }
}

impl std::str::FromStr for TranslatorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "server" => Ok(Self::Server),
            _ => Err(anyhow!("Invalid translator mode: {}", s)),
        }
    }
}

/// plamo-translate configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Process model used for translation
    #[serde(default)]
    pub mode: TranslatorMode,

    /// Translator executable
    #[serde(default = "default_translator_binary")]
    pub binary: String,

    /// Estimated-token budget per batch
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,

    /// Timeout for a single translate call in seconds
    #[serde(default = "default_translate_timeout_secs")]
    pub timeout_secs: u64,

    /// Grace period after spawning the server before it is considered ready
    #[serde(default = "default_server_startup_secs")]
    pub server_startup_secs: u64,

    /// Provenance tag stored with each translation
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            mode: TranslatorMode::default(),
            binary: default_translator_binary(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_translate_timeout_secs(),
            server_startup_secs: default_server_startup_secs(),
            source_tag: default_source_tag(),
        }
    }
}

/// whisper CLI configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WhisperConfig {
    /// whisper executable
    #[serde(default = "default_whisper_binary")]
    pub binary: String,

    /// Model name (e.g., "base", "small", "large-v3")
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Spoken language hint; whisper auto-detects when unset
    #[serde(default)]
    pub language: Option<String>,

    /// Timeout in seconds
    #[serde(default = "default_whisper_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary: default_whisper_binary(),
            model: default_whisper_model(),
            language: None,
            timeout_secs: default_whisper_timeout_secs(),
        }
    }
}

/// yt-dlp configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YtDlpConfig {
    /// yt-dlp executable
    #[serde(default = "default_ytdlp_binary")]
    pub binary: String,

    /// Timeout in seconds
    #[serde(default = "default_ytdlp_timeout_secs")]
    pub timeout_secs: u64,

    /// Only list the first N videos of a channel
    #[serde(default)]
    pub playlist_limit: Option<usize>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: default_ytdlp_binary(),
            timeout_secs: default_ytdlp_timeout_secs(),
            playlist_limit: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate's filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ja".to_string()
}

fn default_translator_binary() -> String {
    "plamo-translate".to_string()
}

fn default_max_tokens() -> i64 {
    7000
}

fn default_translate_timeout_secs() -> u64 {
    300
}

fn default_server_startup_secs() -> u64 {
    10
}

fn default_source_tag() -> String {
    "plamo".to_string()
}

fn default_whisper_binary() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

fn default_whisper_timeout_secs() -> u64 {
    3600 // long videos take a while on CPU
}

fn default_ytdlp_binary() -> String {
    "yt-dlp".to_string()
}

fn default_ytdlp_timeout_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from a JSON file, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language must differ (both are '{}')",
                self.target_language
            ));
        }

        if self.translator.max_tokens <= 0 {
            return Err(anyhow!("translator.max_tokens must be positive, got {}", self.translator.max_tokens));
        }

        for (name, binary) in [
            ("translator.binary", &self.translator.binary),
            ("whisper.binary", &self.whisper.binary),
            ("ytdlp.binary", &self.ytdlp.binary),
        ] {
            if binary.trim().is_empty() {
                return Err(anyhow!("{} cannot be empty", name));
            }
        }

        if let Some(language) = &self.whisper.language {
            crate::language_utils::validate_language_code(language)?;
        }

        Ok(())
    }

    /// Resolve the database path, falling back to the user data directory
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            database_path: None,
            translator: TranslatorConfig::default(),
            whisper: WhisperConfig::default(),
            ytdlp: YtDlpConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
