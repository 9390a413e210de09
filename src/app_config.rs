use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::formats::ParseSettings;
use crate::pipeline::LoadSettings;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source (learner-facing) language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target (translation) language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Bilingual alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Playback synchronization settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Read-along narration settings
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Caption fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Parser configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParserConfig {
    /// Timed-text fragments closer than this are merged (seconds)
    #[serde(default = "default_fragment_gap_secs")]
    pub fragment_gap_secs: f64,

    /// Merged fragment text stops growing at this many characters
    #[serde(default = "default_fragment_max_chars")]
    pub fragment_max_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            fragment_gap_secs: default_fragment_gap_secs(),
            fragment_max_chars: default_fragment_max_chars(),
        }
    }
}

/// Alignment configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlignmentConfig {
    /// Maximum start-time difference for pairing a translation (seconds)
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Clock tick interval of the simulated transport (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Step used by interactive offset nudges (seconds)
    #[serde(default = "default_offset_step_secs")]
    pub offset_step_secs: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            offset_step_secs: default_offset_step_secs(),
        }
    }
}

/// Narration configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NarrationConfig {
    /// Narration starts this long before the sentence end (seconds)
    #[serde(default = "default_pre_trigger_secs")]
    pub pre_trigger_secs: f64,

    /// Delay between pausing and speaking (milliseconds)
    #[serde(default = "default_speak_delay_ms")]
    pub speak_delay_ms: u64,

    /// Voice locale for the translation
    #[serde(default = "default_speech_locale")]
    pub speech_locale: String,

    /// Relative speaking rate (0.0 to 1.0)
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,

    /// Whether sessions start with narration on
    #[serde(default)]
    pub enabled_by_default: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            pre_trigger_secs: default_pre_trigger_secs(),
            speak_delay_ms: default_speak_delay_ms(),
            speech_locale: default_speech_locale(),
            speech_rate: default_speech_rate(),
            enabled_by_default: false,
        }
    }
}

impl NarrationConfig {
    // @returns: Speak delay as Duration
    pub fn speak_delay(&self) -> Duration {
        Duration::from_millis(self.speak_delay_ms)
    }
}

/// Fetch configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with caption requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Locale requested from machine-translated timedtext tracks
    #[serde(default = "default_translation_locale")]
    pub translation_locale: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            translation_locale: default_translation_locale(),
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

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
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
    "zh".to_string()
}

fn default_fragment_gap_secs() -> f64 {
    0.5
}

fn default_fragment_max_chars() -> usize {
    100
}

fn default_tolerance_secs() -> f64 {
    0.5
}

fn default_tick_interval_ms() -> u64 {
    33 // ~30 Hz, matches the player's periodic time observer
}

fn default_offset_step_secs() -> f64 {
    0.5
}

fn default_pre_trigger_secs() -> f64 {
    0.3
}

fn default_speak_delay_ms() -> u64 {
    100
}

fn default_speech_locale() -> String {
    "zh-CN".to_string()
}

fn default_speech_rate() -> f32 {
    0.5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("readalong/{}", env!("CARGO_PKG_VERSION"))
}

fn default_translation_locale() -> String {
    "zh-Hans".to_string()
}

impl Config {
    /// Load configuration from a JSON file, writing defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            return Ok(config);
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if !(self.parser.fragment_gap_secs > 0.0) {
            return Err(anyhow!("parser.fragment_gap_secs must be positive"));
        }
        if self.parser.fragment_max_chars == 0 {
            return Err(anyhow!("parser.fragment_max_chars must be positive"));
        }
        if !(self.alignment.tolerance_secs > 0.0) {
            return Err(anyhow!("alignment.tolerance_secs must be positive"));
        }
        if self.sync.tick_interval_ms == 0 {
            return Err(anyhow!("sync.tick_interval_ms must be positive"));
        }
        if !(self.sync.offset_step_secs > 0.0) {
            return Err(anyhow!("sync.offset_step_secs must be positive"));
        }
        if !(self.narration.pre_trigger_secs >= 0.0) {
            return Err(anyhow!("narration.pre_trigger_secs must not be negative"));
        }
        if self.narration.speech_locale.trim().is_empty() {
            return Err(anyhow!("narration.speech_locale is required"));
        }

        Ok(())
    }

    /// Settings for the loading pipeline
    pub fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            parse: ParseSettings {
                fragment_gap_secs: self.parser.fragment_gap_secs,
                fragment_max_chars: self.parser.fragment_max_chars,
            },
            alignment_tolerance_secs: self.alignment.tolerance_secs,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            parser: ParserConfig::default(),
            alignment: AlignmentConfig::default(),
            sync: SyncConfig::default(),
            narration: NarrationConfig::default(),
            fetch: FetchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
