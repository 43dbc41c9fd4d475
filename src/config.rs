use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::ingest::backend::DEFAULT_BACKEND_URL;
use crate::normalization::genres::AllowedGenres;
use crate::sources::rawg::{DEFAULT_PAGE_SIZE, DEFAULT_RAWG_BASE_URL};
use crate::util::env::{parse_or, redact_value};

pub const DEFAULT_MAX_GAMES: usize = 120;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run configuration, built once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub rawg_api_key: String,
    pub rawg_base_url: String,
    pub backend_url: String,
    pub max_games: usize,
    pub page_size: u32,
    pub timeout: Duration,
    pub allowed_genres: AllowedGenres,
    pub skip_health_check: bool,
}

/// Values supplied on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rawg_base_url: Option<String>,
    pub backend_url: Option<String>,
    pub max_games: Option<usize>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub allowed_genres: Option<Vec<String>>,
    pub skip_health_check: bool,
}

impl CollectorConfig {
    /// Build from a key lookup (the process environment in the binary); blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(rawg_api_key) = get("RAWG_API_KEY") else {
            bail!("RAWG_API_KEY not found in environment; set RAWG_API_KEY in your .env file");
        };

        let allowed_genres = get("ALLOWED_GENRES")
            .map(|raw| AllowedGenres::from_csv(&raw))
            .unwrap_or_default();

        let cfg = Self {
            rawg_api_key: rawg_api_key.trim().to_string(),
            rawg_base_url: get("RAWG_BASE_URL").unwrap_or_else(|| DEFAULT_RAWG_BASE_URL.to_string()),
            backend_url: get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            max_games: parse_or(get("MAX_NUM_GAMES").as_deref(), DEFAULT_MAX_GAMES),
            page_size: parse_or(get("RAWG_PAGE_SIZE").as_deref(), DEFAULT_PAGE_SIZE),
            timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS").as_deref(),
                DEFAULT_TIMEOUT_SECS,
            )),
            allowed_genres,
            skip_health_check: false,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(url) = overrides.rawg_base_url {
            self.rawg_base_url = url;
        }
        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(n) = overrides.max_games {
            self.max_games = n;
        }
        if let Some(n) = overrides.page_size {
            self.page_size = n;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(genres) = overrides.allowed_genres {
            self.allowed_genres = AllowedGenres::new(genres);
        }
        self.skip_health_check |= overrides.skip_health_check;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.max_games == 0 {
            bail!("max games must be at least 1");
        }
        if self.page_size == 0 {
            bail!("RAWG page size must be at least 1");
        }
        if self.timeout.is_zero() {
            bail!("HTTP timeout must be at least 1 second");
        }
        if self.allowed_genres.is_empty() {
            bail!("allowed genre list is empty; every game would be rejected");
        }
        Ok(())
    }

    /// Log the effective configuration with the API key masked.
    pub fn log_snapshot(&self) {
        info!(
            target = "config",
            rawg_api_key = %redact_value("RAWG_API_KEY", &self.rawg_api_key),
            rawg_base_url = %self.rawg_base_url,
            backend_url = %self.backend_url,
            max_games = self.max_games,
            page_size = self.page_size,
            timeout_secs = self.timeout.as_secs(),
            allowed_genres = ?self.allowed_genres.iter().collect::<Vec<_>>(),
            skip_health_check = self.skip_health_check,
            "configuration snapshot"
        );
    }
}
