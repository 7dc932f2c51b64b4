use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the bot configuration including loading,
/// environment overrides and validation.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Bot API connection settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Users allowed to drive the bot
    #[serde(default)]
    pub authorized_user_ids: Vec<i64>,

    /// Channel the messages are read from
    #[serde(default)]
    pub source_channel_id: i64,

    /// Forum group the topics are created in
    #[serde(default)]
    pub destination_group_id: i64,

    /// Scratch chat used to read source message content
    #[serde(default)]
    pub staging_chat_id: Option<i64>,

    /// Range transfer settings
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Bot API connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(default = "String::new")]
    pub token: String,

    /// Bot API server URL
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Timeout for ordinary requests, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Server-side wait of a long-poll request, in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Retries granted to a request hit by flood control
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_endpoint: default_api_endpoint(),
            timeout_secs: default_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// How each source message is moved into the destination thread
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Native relay only
    Direct,
    /// Fetch and rebuild only
    Manual,
    /// Native relay, rebuilding the message when relay fails
    #[default]
    DirectThenManual,
}

impl TransferMode {
    // @returns: Human readable mode name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Direct => "Direct relay",
            Self::Manual => "Manual reconstruct",
            Self::DirectThenManual => "Direct relay with manual fallback",
        }
    }

    // @returns: Whether the mode reads source message content
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Direct)
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::Manual => "manual",
            Self::DirectThenManual => "direct_then_manual",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for TransferMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "direct" => Ok(Self::Direct),
            "manual" => Ok(Self::Manual),
            "direct_then_manual" | "fallback" => Ok(Self::DirectThenManual),
            _ => Err(anyhow!("Invalid transfer mode: {}", s)),
        }
    }
}

/// Range transfer settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Strategy selection
    #[serde(default)]
    pub mode: TransferMode,

    /// Delay between two consecutive transfer attempts, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Edit the progress message after this many processed positions
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    /// Relay without the "forwarded from" header
    #[serde(default = "default_true")]
    pub suppress_provenance: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            delay_ms: default_delay_ms(),
            progress_every: default_progress_every(),
            suppress_provenance: true,
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

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_api_endpoint() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_timeout_secs() -> u64 {
    25
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1500 // 1.5s between transfers keeps a bot under the group send limit
}

fn default_progress_every() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(anyhow!("Bot token is required (telegram.token or TELEGRAM_BOT_TOKEN)"));
        }
        if self.authorized_user_ids.is_empty() {
            return Err(anyhow!("At least one authorized user id is required (AUTHORIZED_USER_IDS)"));
        }
        if self.source_channel_id == 0 {
            return Err(anyhow!("Source channel id is required (SOURCE_CHANNEL_ID)"));
        }
        if self.destination_group_id == 0 {
            return Err(anyhow!("Destination group id is required (DESTINATION_GROUP_ID)"));
        }
        if self.transfer.progress_every == 0 {
            return Err(anyhow!("transfer.progress_every must be at least 1"));
        }
        if self.transfer.mode == TransferMode::Manual && self.staging_chat_id.is_none() {
            return Err(anyhow!("Manual transfer mode needs a staging chat (staging_chat_id or STAGING_CHAT_ID)"));
        }

        Ok(())
    }

    /// Transfer mode that can actually run with this configuration
    ///
    /// The manual fallback cannot read messages without a staging chat, so
    /// `direct_then_manual` degrades to `direct` in that case.
    pub fn effective_mode(&self) -> TransferMode {
        match self.transfer.mode {
            TransferMode::DirectThenManual if self.staging_chat_id.is_none() => TransferMode::Direct,
            mode => mode,
        }
    }

    /// Whether a user may drive the bot
    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.authorized_user_ids.contains(&user_id)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(ids) = lookup("AUTHORIZED_USER_IDS") {
            self.authorized_user_ids = parse_id_list(&ids)
                .context("AUTHORIZED_USER_IDS must be a comma separated list of user ids")?;
        }
        if let Some(id) = lookup("SOURCE_CHANNEL_ID") {
            self.source_channel_id = id.trim().parse()
                .with_context(|| format!("Invalid SOURCE_CHANNEL_ID: {}", id))?;
        }
        if let Some(id) = lookup("DESTINATION_GROUP_ID") {
            self.destination_group_id = id.trim().parse()
                .with_context(|| format!("Invalid DESTINATION_GROUP_ID: {}", id))?;
        }
        if let Some(id) = lookup("STAGING_CHAT_ID") {
            self.staging_chat_id = Some(id.trim().parse()
                .with_context(|| format!("Invalid STAGING_CHAT_ID: {}", id))?);
        }
        if let Some(seconds) = lookup("DELAY_BETWEEN_FORWARDS") {
            let seconds: f64 = seconds.trim().parse()
                .with_context(|| format!("Invalid DELAY_BETWEEN_FORWARDS: {}", seconds))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(anyhow!("DELAY_BETWEEN_FORWARDS must be a non-negative number of seconds"));
            }
            self.transfer.delay_ms = (seconds * 1000.0).round() as u64;
        }
        if let Some(mode) = lookup("TRANSFER_MODE") {
            self.transfer.mode = mode.parse()?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.parse()?;
        }

        Ok(())
    }
}

/// Parse "1, 2,3" into ids, skipping empty items
fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<i64>().with_context(|| format!("Invalid user id: {}", item)))
        .collect()
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            telegram: TelegramConfig::default(),
            authorized_user_ids: Vec::new(),
            source_channel_id: 0,
            destination_group_id: 0,
            staging_chat_id: None,
            transfer: TransferConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
