use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the bot credential
pub const TOKEN_VAR: &str = "BOT_TOKEN";
/// Environment variable pointing at an optional TOML override file
pub const CONFIG_VAR: &str = "FORWARDBOT_CONFIG";

/// Retry timing is fixed, so a `[retry]` section is rejected along with any
/// other unknown key.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Never read from the TOML file, only from the environment
    #[serde(skip)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

#[derive(Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelsConfig {
    #[serde(default = "default_source")]
    pub source: i64,
    /// Order is kept and duplicates are not removed
    #[serde(default = "default_targets")]
    pub targets: Vec<i64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    /// Size bound of the live file; 0 disables rotation
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Rotated files kept next to the live one
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_cron")]
    pub cron: String,
}

fn default_source() -> i64 {
    -1002595754142
}

fn default_targets() -> Vec<i64> {
    vec![
        -1002662372702,
        -1002544806787,
        -1002482016247,
        -1002194080801,
        -1002254333982,
        -1002942441427,
        -1002444944113,
        -1002748481631,
        -1002226126447,
        -1002284018291,
        -1002033860396,
    ]
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "app.log".to_string()
}

fn default_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_max_files() -> usize {
    7
}

fn default_heartbeat_cron() -> String {
    "0 0 * * * *".to_string()
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            targets: default_targets(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file_name: default_log_file(),
            max_bytes: default_max_bytes(),
            max_files: default_max_files(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            cron: default_heartbeat_cron(),
        }
    }
}

impl LoggingConfig {
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

impl Config {
    /// Read the process environment once.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    /// A missing or blank token is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .with_context(|| format!("{} is missing", TOKEN_VAR))?;

        let mut config = match lookup(CONFIG_VAR).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => Self::defaults(),
        };
        config.telegram.bot_token = bot_token;

        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn defaults() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            channels: ChannelsConfig::default(),
            logging: LoggingConfig::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}
