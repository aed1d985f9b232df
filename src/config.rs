//! Application configuration structure
use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use reqwest::Url;
use secrecy::SecretString;

use crate::challenge::DEFAULT_COOLDOWN_SECS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_CHALLENGE_API_URL: &str = "http://127.0.0.1:8080/api/generateChallenge";
pub const DEFAULT_CHALLENGE_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Directory for durable progress; in-memory when unset
    pub state_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub challenge_api_url: Url,
    pub challenge_api_key: Option<SecretString>,
    pub challenge_cooldown: chrono::TimeDelta,
    pub challenge_timeout: Duration,
}

impl AppConfig {
    /// Read the environment, after loading `.env` if one exists
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let challenge_api_url = get("CHALLENGE_API_URL")
            .unwrap_or_else(|| DEFAULT_CHALLENGE_API_URL.to_string());
        let challenge_api_url =
            Url::parse(&challenge_api_url).context("CHALLENGE_API_URL is not a valid URL")?;

        let cooldown_secs = match get("CHALLENGE_COOLDOWN_SECS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .context("CHALLENGE_COOLDOWN_SECS must be a whole number of seconds")?
                .into(),
            None => DEFAULT_COOLDOWN_SECS,
        };
        let timeout_secs = match get("CHALLENGE_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .context("CHALLENGE_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_CHALLENGE_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            state_dir: get("STATE_DIR").map(PathBuf::from),
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            challenge_api_url,
            challenge_api_key: get("CHALLENGE_API_KEY").map(SecretString::from),
            challenge_cooldown: chrono::TimeDelta::seconds(cooldown_secs),
            challenge_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
