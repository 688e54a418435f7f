//! Configuration management
//!
//! Manages responder, voice, conversation and display settings, stored as
//! TOML in the platform config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language::Language;

/// Environment variable overriding `responder.base_url`
pub const URL_ENV_VAR: &str = "VOICE_COMPANION_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Remote responder settings
    #[serde(default)]
    pub responder: ResponderConfig,
    /// Speech settings
    #[serde(default)]
    pub voice: VoiceConfig,
    /// Conversation settings
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Display settings
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponderConfig {
    /// Base URL of the responder (`/chat` and `/` are appended)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout for each request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::agent::responder::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceConfig {
    /// Initial conversation language tag
    #[serde(default)]
    pub language: Language,
    /// Playback rate (1.0 = platform natural speed)
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,
    /// Pick the playback language from the reply's script instead of the
    /// selected language
    #[serde(default = "default_true")]
    pub detect_reply_language: bool,
}

fn default_speech_rate() -> f32 {
    crate::voice::playback::DEFAULT_SPEECH_RATE
}

fn default_true() -> bool {
    true
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            speech_rate: default_speech_rate(),
            detect_reply_language: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationConfig {
    /// Assistant message the log starts with; empty for none
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_greeting() -> String {
    "Namaste! Hello! How can I help you today?".to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// How long a transient error stays visible
    #[serde(default = "default_error_display_secs")]
    pub error_display_secs: u64,
}

fn default_error_display_secs() -> u64 {
    5
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            error_display_secs: default_error_display_secs(),
        }
    }
}

impl UiConfig {
    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            config
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;

        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.responder.base_url = url.trim().to_string();
            }
        }
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "voice-companion", "voice-companion")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Responder:");
    println!("  base_url:              {}", config.responder.base_url);
    println!("  timeout:               {}s", config.responder.timeout_secs);
    println!("Voice:");
    println!(
        "  language:              {} ({})",
        config.voice.language,
        config.voice.language.display_name()
    );
    println!("  speech_rate:           {}", config.voice.speech_rate);
    println!("  detect_reply_language: {}", config.voice.detect_reply_language);
    println!("Conversation:");
    println!("  greeting:              {:?}", config.conversation.greeting);
    println!("UI:");
    println!("  error_display:         {}s", config.ui.error_display_secs);

    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}
