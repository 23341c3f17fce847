use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables checked for the bot token, in order.
pub const TOKEN_VARS: [&str; 2] = ["BOT_TOKEN", "TELOXIDE_TOKEN"];

const DEFAULT_CONFIG_FILE: &str = "config.toml";

const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    pub polling: PollingConfig,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_hadith_base_url")]
    pub hadith_base_url: String,
    #[serde(default = "default_hadith_range")]
    pub hadith_range: String,
    #[serde(default = "default_page_image_base_url")]
    pub page_image_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            hadith_base_url: default_hadith_base_url(),
            hadith_range: default_hadith_range(),
            page_image_base_url: default_page_image_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PollingConfig {
    /// Pause before polling again after a receive failure
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    #[serde(default = "default_long_poll_timeout_secs")]
    pub long_poll_timeout_secs: u32,
    /// Drop updates queued while the bot was offline
    #[serde(default = "default_true")]
    pub skip_pending: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: default_restart_delay_secs(),
            long_poll_timeout_secs: default_long_poll_timeout_secs(),
            skip_pending: true,
        }
    }
}

impl PollingConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// HTTP timeout for Bot API calls. Must outlast the server-side
    /// long-poll wait, or every idle poll is cut off as a failure.
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.long_poll_timeout_secs) + CLIENT_TIMEOUT_MARGIN_SECS)
    }
}

/// On-disk shape of `config.toml`. The token never lives here.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    providers: ProvidersConfig,
    #[serde(default)]
    polling: PollingConfig,
}

fn default_hadith_base_url() -> String {
    "https://api.hadith.gading.dev".to_string()
}

fn default_hadith_range() -> String {
    "1-300".to_string()
}

fn default_page_image_base_url() -> String {
    "https://quran.ksu.edu.sa/png_big".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_restart_delay_secs() -> u64 {
    5
}

fn default_long_poll_timeout_secs() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load from the process environment and an optional config file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok(), path)
    }

    /// Load using `lookup` for environment variables.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `config.toml` is read if present and defaults apply otherwise.
    pub fn load_with<F>(lookup: F, path: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = TOKEN_VARS
            .iter()
            .filter_map(|key| lookup(*key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .with_context(|| {
                format!(
                    "Bot token is missing: set the {} environment variable",
                    TOKEN_VARS[0]
                )
            })?;

        let file = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::read_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::read_file(&default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Config {
            telegram: TelegramConfig { bot_token },
            providers: file.providers,
            polling: file.polling,
        })
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse_file(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse_file(content: &str) -> Result<FileConfig> {
        Ok(toml::from_str(content)?)
    }
}
