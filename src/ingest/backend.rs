use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::CollectorConfig;
use crate::models::NormalizedGame;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Longest slice of an error body carried into a failure reason.
const MAX_REASON_BODY: usize = 200;

/// Outcome of posting one game to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Created,
    /// The backend answered 409: the game is already stored.
    AlreadyExists,
    Failed(String),
}

/// Client for the games backend write API (`POST {backend}/games`).
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    games_endpoint: String,
}

impl BackendClient {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build backend http client")?;
        Ok(Self {
            http,
            games_endpoint: format!("{}/games", backend_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(cfg: &CollectorConfig) -> Result<Self> {
        Self::new(&cfg.backend_url, cfg.timeout)
    }

    /// Check the games listing before a run. A 2xx or a 404 (route exists,
    /// nothing stored yet) counts as reachable; anything else is an error.
    pub async fn health_check(&self) -> Result<StatusCode> {
        let resp = self
            .http
            .get(&self.games_endpoint)
            .send()
            .await
            .with_context(|| format!("cannot connect to backend at {}", self.games_endpoint))?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            info!(%status, endpoint = %self.games_endpoint, "backend reachable");
            Ok(status)
        } else {
            bail!(
                "backend at {} answered with status {}",
                self.games_endpoint,
                status
            )
        }
    }

    /// Single create attempt; never retried here.
    pub async fn send_game(&self, game: &NormalizedGame) -> IngestOutcome {
        let resp = match self.http.post(&self.games_endpoint).json(game).send().await {
            Ok(resp) => resp,
            Err(err) => return IngestOutcome::Failed(err.to_string()),
        };

        let status = resp.status();
        debug!(%status, name = game.display_name(), "backend create response");
        if status.is_success() {
            return IngestOutcome::Created;
        }
        if status == StatusCode::CONFLICT {
            return IngestOutcome::AlreadyExists;
        }

        let body = resp.text().await.unwrap_or_default();
        IngestOutcome::Failed(failure_reason(status, &body))
    }
}

fn failure_reason(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let snippet: String = body.chars().take(MAX_REASON_BODY).collect();
    format!("HTTP {status}: {snippet}")
}
