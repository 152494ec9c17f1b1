//! Configuration loading from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use notaline_core::TelegramNotifier;
use notaline_sankhya::{Credentials, Endpoints, RetryPolicy};

/// Global configuration for notaline.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sankhya: SankhyaConfig,
    pub paths: PathsConfig,
    pub workers: WorkersConfig,
    pub retry: RetryConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SankhyaConfig {
    pub login_url: String,
    pub query_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub token: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub appkey: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
}

impl Default for SankhyaConfig {
    fn default() -> Self {
        let endpoints = Endpoints::default();
        Self {
            login_url: endpoints.login_url,
            query_url: endpoints.query_url,
            token: std::env::var("SANKHYA_TOKEN").ok(),
            appkey: std::env::var("SANKHYA_APPKEY").ok(),
            username: std::env::var("SANKHYA_USERNAME").ok(),
            password: std::env::var("SANKHYA_PASSWORD").ok(),
        }
    }
}

impl SankhyaConfig {
    /// Credential bundle, present only when every secret is set.
    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            token: self.token.clone()?,
            appkey: self.appkey.clone()?,
            username: self.username.clone()?,
            password: self.password.clone()?,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            login_url: self.login_url.clone(),
            query_url: self.query_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub xml_dir: PathBuf,
    pub queries_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            xml_dir: PathBuf::from("xmls"),
            queries_dir: PathBuf::from("queries"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            default: 15,
            max: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub auth_attempts: u32,
    pub auth_delay_secs: u64,
    pub query_attempts: u32,
    pub query_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            auth_attempts: 5,
            auth_delay_secs: 3,
            query_attempts: 5,
            query_delay_secs: 7,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            auth_attempts: self.auth_attempts,
            auth_delay: Duration::from_secs(self.auth_delay_secs),
            query_attempts: self.query_attempts,
            query_delay: Duration::from_secs(self.query_delay_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub bot_token: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: std::env::var("BOTTOKEN").ok(),
            chat_id: std::env::var("CHATID").ok(),
        }
    }
}

impl TelegramConfig {
    /// Notifier, present only when both token and chat id are set.
    pub fn notifier(&self) -> Option<TelegramNotifier> {
        match (&self.bot_token, &self.chat_id) {
            (Some(token), Some(chat)) => Some(TelegramNotifier::new(token, chat)),
            _ => None,
        }
    }
}

/// Deserialize a string that may reference an environment variable like ${VAR}.
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to the environment variable's value.
fn expand_env_var(s: &str) -> Option<String> {
    match s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).ok(),
        None => Some(s.to_string()),
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Search order:
    /// 1. ./notaline.toml (current directory)
    /// 2. ~/.config/notaline/config.toml
    ///
    /// Falls back to defaults when no file is found.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("notaline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "notaline") {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}
