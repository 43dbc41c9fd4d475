use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::models::{CollectedGame, RawItem};

pub const DEFAULT_RAWG_BASE_URL: &str = "https://api.rawg.io/api";
pub const DEFAULT_PAGE_SIZE: u32 = 40;

/// Rows stay untyped so one odd row is skipped on its own instead of failing
/// the decode of the whole page.
#[derive(Debug, Deserialize)]
struct RawgListResponse {
    next: Option<Value>,
    results: Vec<Value>,
}

impl RawgListResponse {
    fn has_next(&self) -> bool {
        self.next
            .as_ref()
            .and_then(Value::as_str)
            .is_some_and(|n| !n.is_empty())
    }
}

/// `{"id": 4, "name": "PC"}`; entries missing either field are dropped.
fn platform_entry(entry: &Value) -> Option<(String, i64)> {
    let name = entry.get("name")?.as_str()?;
    let id = entry.get("id")?.as_i64()?;
    Some((name.to_string(), id))
}

/// Listing rows only carry summary fields; the detail endpoint fills in the rest.
fn row_id(row: &Value) -> Option<i64> {
    row.get("id")?.as_i64()
}

fn screenshot_urls(row: &Value) -> Vec<String> {
    row.get("short_screenshots")
        .and_then(Value::as_array)
        .map(|shots| {
            shots
                .iter()
                .filter_map(|s| s.get("image")?.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Why paging stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEnd {
    /// The listing reported no further pages.
    Exhausted,
    /// `max_items` accepted games were gathered.
    LimitReached,
    /// A page request failed; earlier pages are kept.
    Aborted { page: u32, reason: String },
}

/// Result of a paged collection. Always carries whatever was gathered, even
/// when paging was cut short.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
    /// Listing rows looked at, including ones that failed detail lookup or
    /// were rejected by the caller.
    pub examined: usize,
    pub end: CollectionEnd,
}

/// Client for the RAWG Video Games Database API.
#[derive(Debug, Clone)]
pub struct RawgClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl RawgClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("game-collector/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build RAWG http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: page_size.max(1),
        })
    }

    pub fn from_config(cfg: &CollectorConfig) -> Result<Self> {
        Self::new(
            cfg.rawg_api_key.clone(),
            &cfg.rawg_base_url,
            cfg.page_size,
            cfg.timeout,
        )
    }

    /// Platform name -> RAWG platform id. Failures are logged and yield an
    /// empty map so the caller can continue without a platform filter.
    pub async fn list_platforms(&self) -> HashMap<String, i64> {
        match self.try_list_platforms().await {
            Ok(platforms) => {
                debug!(count = platforms.len(), "RAWG platforms fetched");
                platforms
            }
            Err(err) => {
                warn!(error = %err, "RAWG platform list request failed; continuing without platform filter");
                HashMap::new()
            }
        }
    }

    async fn try_list_platforms(&self) -> Result<HashMap<String, i64>> {
        let url = format!("{}/platforms", self.base_url);
        let list: RawgListResponse = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let platforms: HashMap<String, i64> =
            list.results.iter().filter_map(platform_entry).collect();
        if platforms.len() < list.results.len() {
            debug!(
                skipped = list.results.len() - platforms.len(),
                "RAWG platform entries without name or id skipped"
            );
        }
        Ok(platforms)
    }

    /// Page through the listing endpoint and look up detail for every row.
    ///
    /// Each detailed game is handed to `accept`; only games it returns `Some`
    /// for count toward `max_items`. Rows whose detail lookup fails are
    /// skipped. A failed page request stops paging and returns what was
    /// gathered so far with [`CollectionEnd::Aborted`].
    pub async fn collect<T, F>(
        &self,
        platform_ids: &[i64],
        max_items: usize,
        mut accept: F,
    ) -> Collection<T>
    where
        F: FnMut(CollectedGame) -> Option<T>,
    {
        let mut items: Vec<T> = Vec::new();
        let mut examined = 0usize;
        let mut page: u32 = 1;
        let mut pages_fetched: u32 = 0;

        let end = loop {
            if items.len() >= max_items {
                break CollectionEnd::LimitReached;
            }

            let list = match self.fetch_page(platform_ids, page).await {
                Ok(list) => list,
                Err(err) => {
                    warn!(page, error = %err, "RAWG list request failed; keeping partial results");
                    println!("error fetching page {page}: {err}");
                    break CollectionEnd::Aborted {
                        page,
                        reason: err.to_string(),
                    };
                }
            };
            pages_fetched += 1;
            let has_next = list.has_next() && !list.results.is_empty();
            debug!(page, count = list.results.len(), has_next, "RAWG page fetched");

            let mut accepted_in_page = 0usize;
            for row in list.results {
                if items.len() >= max_items {
                    break;
                }
                examined += 1;
                let Some(game_id) = row_id(&row) else {
                    debug!(page, "RAWG listing row without id; skipping");
                    continue;
                };
                let screenshots = screenshot_urls(&row);
                let Some(detail) = self.fetch_game_detail(game_id).await else {
                    continue;
                };
                if let Some(item) = accept(CollectedGame {
                    detail,
                    screenshots,
                }) {
                    items.push(item);
                    accepted_in_page += 1;
                }
            }

            println!(
                "page {page}: collected {accepted_in_page} games (total: {}/{max_items})",
                items.len()
            );

            if items.len() >= max_items {
                break CollectionEnd::LimitReached;
            }
            if !has_next {
                break CollectionEnd::Exhausted;
            }
            page += 1;
        };

        info!(
            collected = items.len(),
            examined,
            pages_fetched,
            end = ?end,
            "RAWG collection finished"
        );

        Collection {
            items,
            pages_fetched,
            examined,
            end,
        }
    }

    async fn fetch_page(&self, platform_ids: &[i64], page: u32) -> Result<RawgListResponse> {
        let url = format!("{}/games", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("page_size", self.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if !platform_ids.is_empty() {
            let joined = platform_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            query.push(("platforms", joined));
        }

        let list = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list)
    }

    /// Full attribute set for one game, or `None` when the lookup fails.
    pub async fn fetch_game_detail(&self, game_id: i64) -> Option<RawItem> {
        match self.try_fetch_game_detail(game_id).await {
            Ok(detail) => Some(detail),
            Err(err) => {
                warn!(game_id, error = %err, "RAWG detail request failed; skipping game");
                None
            }
        }
    }

    async fn try_fetch_game_detail(&self, game_id: i64) -> Result<RawItem> {
        let url = format!("{}/games/{}", self.base_url, game_id);
        let body: Value = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match body {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("unexpected detail payload type: {}", json_kind(&other))),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
