use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::language_utils::{self, Script};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch processing config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: DeepL REST API
    #[default]
    DeepL,
    // @provider: Offline mock, prefixes texts with the target language
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepL => "DeepL",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::DeepL => "deepl".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(Self::DeepL),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Active provider
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: API key (DeepL keys ending in ":fx" use the free endpoint)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL override, empty means derive from the key
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Optional glossary applied by the service
    #[serde(default)]
    pub glossary_id: Option<String>,

    // @field: Texts per request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    // @field: Pause between requests
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    // @field: Attempts per request on rate-limit/overload
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff, grows linearly per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TranslationConfig {
    // @returns: Pause inserted between chunk requests
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    // @returns: Base backoff for the retry policy
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    // @returns: HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            api_key: String::new(),
            endpoint: String::new(),
            glossary_id: None,
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings for processing several documents at once
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    // @field: Documents processed in parallel
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    // @field: Appended to the file stem of every output document
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent_files: default_concurrent_files(),
            output_suffix: default_output_suffix(),
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
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "ko".to_string()
}

fn default_chunk_size() -> usize {
    50
}

fn default_chunk_delay_ms() -> u64 {
    500
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_concurrent_files() -> usize {
    2
}

fn default_output_suffix() -> String {
    "_translated".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Script of the texts that get extracted
    pub fn source_script(&self) -> Result<Script> {
        Script::for_language(&self.source_language)
    }

    /// Script that marks a text as already translated
    pub fn target_script(&self) -> Result<Script> {
        Script::for_language(&self.target_language)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::get_language_name(&self.source_language)?;
        language_utils::get_language_name(&self.target_language)?;

        let source = self.source_script()?;
        let target = self.target_script()?;
        if source == target {
            return Err(anyhow!(
                "Source and target languages use the same script: {} / {}",
                self.source_language,
                self.target_language
            ));
        }

        if self.translation.provider == TranslationProvider::DeepL
            && self.translation.api_key.trim().is_empty()
        {
            return Err(anyhow!("Translation API key is required for DeepL provider"));
        }

        if self.translation.chunk_size == 0 {
            return Err(anyhow!("translation.chunk_size must be greater than zero"));
        }

        if self.translation.retry_count == 0 {
            return Err(anyhow!("translation.retry_count must be greater than zero"));
        }

        if self.batch.concurrent_files == 0 {
            return Err(anyhow!("batch.concurrent_files must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
