use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A game as returned by the RAWG detail endpoint, kept as an untyped object so
/// that missing or oddly-typed fields reject or skip instead of failing decode.
pub type RawItem = Map<String, Value>;

/// A detailed game paired with the screenshot URLs from its listing row.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedGame {
    pub detail: RawItem,
    pub screenshots: Vec<String>,
}

/// Fixed-shape record accepted by the backend `POST /games` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGame {
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub description: String,
    pub background_image: Option<String>,
    pub playtime: Option<Number>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub publishers: Vec<String>,
    pub metacritic_score: Number,
    pub screenshots: Vec<String>,
}

impl NormalizedGame {
    /// Name used in progress output; RAWG occasionally omits it.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
