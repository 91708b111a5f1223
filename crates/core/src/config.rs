use std::time::Duration;

use crate::types::SkipType;

pub const DEFAULT_API_URL: &str = "https://api.aniskip.com";
pub const API_URL_ENV: &str = "SKIPGATE_API_URL";
pub const TIMEOUT_ENV: &str = "SKIPGATE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub types: Vec<SkipType>,
    /// `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            types: SkipType::ALL.to_vec(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `SKIPGATE_API_URL` and `SKIPGATE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
            }
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
