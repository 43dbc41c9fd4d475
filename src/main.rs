use anyhow::Result;
use clap::Parser;
use game_collector::config::ConfigOverrides;
use game_collector::logging::{init_tracing, DEFAULT_FILTER};
use game_collector::orchestrator::run_collector;
use game_collector::util::env;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "game-collector",
    version,
    about = "Collect games from RAWG and send them to the games backend"
)]
struct Cli {
    /// Maximum number of valid games to collect (default: MAX_NUM_GAMES or 120)
    #[arg(long)]
    max_games: Option<usize>,
    /// RAWG listing page size (default: RAWG_PAGE_SIZE or 40)
    #[arg(long)]
    page_size: Option<u32>,
    /// Backend base URL; games are posted to {url}/games (default: BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,
    /// RAWG API base URL (default: RAWG_BASE_URL or https://api.rawg.io/api)
    #[arg(long)]
    rawg_base_url: Option<String>,
    /// Per-request timeout in seconds (default: HTTP_TIMEOUT_SECS or 30)
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Comma-separated genre names accepted by the backend (default: ALLOWED_GENRES)
    #[arg(long, value_delimiter = ',')]
    allowed_genres: Option<Vec<String>>,
    /// Do not check the backend before collecting
    #[arg(long, default_value_t = false)]
    skip_health_check: bool,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            rawg_base_url: self.rawg_base_url,
            backend_url: self.backend_url,
            max_games: self.max_games,
            page_size: self.page_size,
            timeout_secs: self.timeout_secs,
            allowed_genres: self.allowed_genres,
            skip_health_check: self.skip_health_check,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    if let Err(err) = init_tracing(DEFAULT_FILTER) {
        eprintln!("{err}");
    }
    let cli = Cli::parse();

    // Configuration problems and an unreachable backend abort before
    // collection; per-game failures only show up in the summary.
    let report = match run_collector(env::env_opt, cli.overrides()).await {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "collector startup failed");
            return Err(err);
        }
    };
    info!(
        sent = report.stats.sent(),
        collection_end = ?report.collection_end,
        "run complete"
    );
    Ok(())
}
