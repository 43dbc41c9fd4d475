pub mod config;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod normalization;
pub mod orchestrator;
pub mod sources;

pub mod util {
    pub mod env;
}

pub use config::{CollectorConfig, ConfigOverrides};
pub use ingest::backend::{BackendClient, IngestOutcome};
pub use models::{CollectedGame, NormalizedGame, RawItem};
pub use normalization::game::GameNormalizer;
pub use orchestrator::{run_collector, Pipeline, RunReport, RunStats};
pub use sources::rawg::{Collection, CollectionEnd, RawgClient};
