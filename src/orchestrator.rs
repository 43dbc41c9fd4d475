use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{CollectorConfig, ConfigOverrides};
use crate::ingest::backend::{BackendClient, IngestOutcome};
use crate::normalization::game::GameNormalizer;
use crate::sources::rawg::{CollectionEnd, RawgClient};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub collected: usize,
    pub inserted: usize,
    pub existed: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Created => self.inserted += 1,
            IngestOutcome::AlreadyExists => self.existed += 1,
            IngestOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Games that reached the backend, whatever the answer.
    pub fn sent(&self) -> usize {
        self.inserted + self.existed + self.failed
    }
}

/// What a run produced: final counters and how collection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStats,
    pub collection_end: CollectionEnd,
}

/// Drives RAWG collection -> normalization -> backend ingestion, one game at a
/// time in collection order.
pub struct Pipeline {
    rawg: RawgClient,
    normalizer: GameNormalizer,
    backend: BackendClient,
}

impl Pipeline {
    pub fn new(rawg: RawgClient, normalizer: GameNormalizer, backend: BackendClient) -> Self {
        Self {
            rawg,
            normalizer,
            backend,
        }
    }

    pub fn from_config(cfg: &CollectorConfig) -> Result<Self> {
        Ok(Self::new(
            RawgClient::from_config(cfg)?,
            GameNormalizer::new(cfg.allowed_genres.clone()),
            BackendClient::from_config(cfg)?,
        ))
    }

    /// Collect up to `max_games` valid games and post each one to the backend.
    ///
    /// Per-game failures are counted, never fatal. When nothing is collected
    /// the backend is not contacted.
    pub async fn run(&self, max_games: usize) -> RunReport {
        let platforms = self.rawg.list_platforms().await;
        let platform_ids: Vec<i64> = platforms.values().copied().collect();

        println!("starting game collection...");
        let normalizer = &self.normalizer;
        let collection = self
            .rawg
            .collect(&platform_ids, max_games, |game| {
                normalizer.normalize(&game.detail, &game.screenshots)
            })
            .await;

        if let CollectionEnd::Aborted { page, reason } = &collection.end {
            warn!(page, reason = %reason, collected = collection.items.len(), "collection cut short; ingesting partial results");
        }

        let games = collection.items;
        let mut stats = RunStats {
            collected: games.len(),
            ..RunStats::default()
        };

        if games.is_empty() {
            println!("no games collected, or an error occurred during collection");
            return RunReport {
                stats,
                collection_end: collection.end,
            };
        }

        println!("collected {} games from RAWG", games.len());
        println!("starting backend ingestion...");

        let total = games.len();
        for (i, game) in games.iter().enumerate() {
            let outcome = self.backend.send_game(game).await;
            let n = i + 1;
            let name = game.display_name();
            match &outcome {
                IngestOutcome::Created => println!("[{n}/{total}] inserted: {name}"),
                IngestOutcome::AlreadyExists => println!("[{n}/{total}] already exists: {name}"),
                IngestOutcome::Failed(reason) => {
                    println!("[{n}/{total}] error with {name}: {reason}")
                }
            }
            stats.record(&outcome);
        }

        info!(
            collected = stats.collected,
            inserted = stats.inserted,
            existed = stats.existed,
            failed = stats.failed,
            "ingestion run finished"
        );
        print_summary(&stats);

        RunReport {
            stats,
            collection_end: collection.end,
        }
    }
}

/// Startup sequence of the binary: configuration, backend health check, then one run.
///
/// `Err` is reserved for the fatal cases (missing credential or invalid
/// configuration, backend unreachable) and is returned before any RAWG
/// request is made. Per-game failures only show up in the report.
pub async fn run_collector<F>(lookup: F, overrides: ConfigOverrides) -> Result<RunReport>
where
    F: Fn(&str) -> Option<String>,
{
    let cfg = CollectorConfig::from_lookup(lookup)?.with_overrides(overrides)?;
    cfg.log_snapshot();

    let pipeline = Pipeline::from_config(&cfg)?;
    if cfg.skip_health_check {
        info!("backend health check skipped");
    } else {
        pipeline.backend.health_check().await?;
        println!("backend connection succeeded");
    }

    Ok(pipeline.run(cfg.max_games).await)
}

pub fn print_summary(stats: &RunStats) {
    println!("games collected: {}", stats.collected);
    println!("games inserted: {}", stats.inserted);
    println!("games already existing: {}", stats.existed);
    println!("errors: {}", stats.failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::genres::AllowedGenres;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn mount_rawg(server: &MockServer, details: &[Value]) {
        Mock::given(method("GET"))
            .and(path("/platforms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 4, "name": "PC"}]
            })))
            .mount(server)
            .await;

        let rows: Vec<Value> = details
            .iter()
            .map(|d| json!({"id": d["id"], "short_screenshots": [{"image": "https://img/shot.jpg"}]}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"next": null, "results": rows})),
            )
            .mount(server)
            .await;

        for detail in details {
            Mock::given(method("GET"))
                .and(path(format!("/games/{}", detail["id"])))
                .respond_with(ResponseTemplate::new(200).set_body_json(detail.clone()))
                .mount(server)
                .await;
        }
    }

    fn pipeline(rawg: &MockServer, backend: &MockServer) -> Pipeline {
        Pipeline::new(
            RawgClient::new("k", &rawg.uri(), 40, TIMEOUT).unwrap(),
            GameNormalizer::new(AllowedGenres::default()),
            BackendClient::new(&backend.uri(), TIMEOUT).unwrap(),
        )
    }

    fn game_a() -> Value {
        json!({"id": 1, "name": "A", "metacritic": 88, "genres": [{"name": "Action"}]})
    }

    fn game_b_without_score() -> Value {
        json!({"id": 2, "name": "B", "genres": [{"name": "Action"}]})
    }

    fn game_c_bad_genre() -> Value {
        json!({"id": 3, "name": "C", "metacritic": 70,
               "genres": [{"name": "Action"}, {"name": "MadeUpGenre"}]})
    }

    #[test]
    fn stats_record_exactly_one_counter() {
        let mut stats = RunStats::default();
        stats.record(&IngestOutcome::Created);
        stats.record(&IngestOutcome::AlreadyExists);
        stats.record(&IngestOutcome::Failed("HTTP 500".into()));
        stats.record(&IngestOutcome::Created);
        assert_eq!((stats.inserted, stats.existed, stats.failed), (2, 1, 1));
        assert_eq!(stats.sent(), 4);
    }

    #[tokio::test]
    async fn only_valid_games_reach_the_backend() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        mount_rawg(&rawg, &[game_a(), game_b_without_score(), game_c_bad_genre()]).await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .and(body_partial_json(json!({
                "name": "A",
                "metacriticScore": 88,
                "screenshots": ["https://img/shot.jpg"]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&backend)
            .await;

        let report = pipeline(&rawg, &backend).run(10).await;
        assert_eq!(
            report.stats,
            RunStats {
                collected: 1,
                inserted: 1,
                existed: 0,
                failed: 0
            }
        );
        assert_eq!(report.collection_end, CollectionEnd::Exhausted);

        let posted = backend.received_requests().await.unwrap();
        assert_eq!(posted.len(), 1);
    }

    #[tokio::test]
    async fn second_run_reports_existing_games() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        mount_rawg(&rawg, &[game_a()]).await;

        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(201))
            .up_to_n_times(1)
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&backend)
            .await;

        let pipeline = pipeline(&rawg, &backend);
        let first = pipeline.run(10).await.stats;
        let second = pipeline.run(10).await.stats;
        assert_eq!((first.inserted, first.existed), (1, 0));
        assert_eq!((second.inserted, second.existed), (0, first.inserted));
    }

    #[tokio::test]
    async fn failures_are_counted_and_run_continues() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        let second = json!({"id": 5, "name": "E", "metacritic": 60, "genres": [{"name": "RPG"}]});
        mount_rawg(&rawg, &[game_a(), second]).await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .and(body_partial_json(json!({"name": "A"})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .and(body_partial_json(json!({"name": "E"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&backend)
            .await;

        let stats = pipeline(&rawg, &backend).run(10).await.stats;
        assert_eq!(stats.collected, 2);
        assert_eq!((stats.inserted, stats.existed, stats.failed), (1, 0, 1));
        assert_eq!(stats.sent(), stats.collected);
    }

    #[tokio::test]
    async fn nothing_collected_skips_backend() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        mount_rawg(&rawg, &[game_b_without_score()]).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&backend)
            .await;

        let report = pipeline(&rawg, &backend).run(10).await;
        assert_eq!(report.stats, RunStats::default());
    }

    #[tokio::test]
    async fn never_sends_more_than_the_limit() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        let details: Vec<Value> = (1..=6)
            .map(|id| json!({"id": id, "name": format!("G{id}"), "metacritic": 80,
                             "genres": [{"name": "Puzzle"}]}))
            .collect();
        mount_rawg(&rawg, &details).await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(201))
            .expect(4)
            .mount(&backend)
            .await;

        let stats = pipeline(&rawg, &backend).run(4).await.stats;
        assert_eq!(stats.collected, 4);
        assert_eq!(stats.inserted, 4);
    }

    #[tokio::test]
    async fn platform_list_failure_still_collects() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/platforms"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&rawg)
            .await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "next": null,
                "results": [{"id": 1}]
            })))
            .mount(&rawg)
            .await;
        Mock::given(method("GET"))
            .and(path("/games/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(game_a()))
            .mount(&rawg)
            .await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&backend)
            .await;

        let stats = pipeline(&rawg, &backend).run(10).await.stats;
        assert_eq!(stats.inserted, 1);
    }

    fn settings(rawg: &MockServer, backend: &MockServer) -> Vec<(&'static str, String)> {
        vec![
            ("RAWG_API_KEY", "k".to_string()),
            ("RAWG_BASE_URL", rawg.uri()),
            ("BACKEND_URL", backend.uri()),
            ("HTTP_TIMEOUT_SECS", "5".to_string()),
        ]
    }

    fn lookup_in(pairs: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[tokio::test]
    async fn missing_credential_stops_before_any_request() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        let mut env = settings(&rawg, &backend);
        env.retain(|(k, _)| *k != "RAWG_API_KEY");

        let result = run_collector(lookup_in(env), ConfigOverrides::default()).await;
        let err = result.expect_err("missing key must be fatal");
        assert!(err.to_string().contains("RAWG_API_KEY"));
        assert!(rawg.received_requests().await.unwrap().is_empty());
        assert!(backend.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unhealthy_backend_stops_before_collection() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&backend)
            .await;

        let result = run_collector(lookup_in(settings(&rawg, &backend)), ConfigOverrides::default()).await;
        assert!(result.is_err());
        assert!(rawg.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_is_fatal() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        let mut env = settings(&rawg, &backend);
        env.retain(|(k, _)| *k != "BACKEND_URL");
        env.push(("BACKEND_URL", "http://127.0.0.1:1".to_string()));

        let result = run_collector(lookup_in(env), ConfigOverrides::default()).await;
        assert!(result.is_err());
        assert!(rawg.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_games_still_complete_the_run() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        mount_rawg(&rawg, &[game_a()]).await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&backend)
            .await;

        let report = run_collector(lookup_in(settings(&rawg, &backend)), ConfigOverrides::default())
            .await
            .expect("per-game failures are not fatal");
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.inserted, 0);
    }

    #[tokio::test]
    async fn skipping_the_health_check_goes_straight_to_collection() {
        let rawg = MockServer::start().await;
        let backend = MockServer::start().await;
        mount_rawg(&rawg, &[game_a()]).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(0)
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&backend)
            .await;

        let overrides = ConfigOverrides {
            skip_health_check: true,
            ..ConfigOverrides::default()
        };
        let report = run_collector(lookup_in(settings(&rawg, &backend)), overrides)
            .await
            .unwrap();
        assert_eq!(report.stats.inserted, 1);
    }
}
