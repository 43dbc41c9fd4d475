use serde_json::{Number, Value};

use crate::models::{NormalizedGame, RawItem};
use crate::normalization::genres::AllowedGenres;
use crate::normalization::sanitize::clean_html_tags;

/// Maps RAWG detail payloads into the backend's game shape.
///
/// Rejection is signalled with `None`: a game without a Metacritic score, or
/// whose genres are empty or fall outside the allowed set, is dropped.
#[derive(Debug, Clone, Default)]
pub struct GameNormalizer {
    allowed_genres: AllowedGenres,
}

impl GameNormalizer {
    pub fn new(allowed_genres: AllowedGenres) -> Self {
        Self { allowed_genres }
    }

    pub fn normalize(&self, game: &RawItem, screenshots: &[String]) -> Option<NormalizedGame> {
        let metacritic_score = metacritic_score(game)?;

        let genres = extract_names(game.get("genres"), name_field);
        if !self.allowed_genres.accepts_all(&genres) {
            return None;
        }

        Some(NormalizedGame {
            name: string_field(game, "name"),
            release_date: string_field(game, "released"),
            description: clean_html_tags(game.get("description").and_then(Value::as_str)),
            background_image: string_field(game, "background_image"),
            playtime: match game.get("playtime") {
                Some(Value::Number(n)) => Some(n.clone()),
                _ => None,
            },
            platforms: extract_names(game.get("platforms"), platform_name),
            genres,
            publishers: extract_names(game.get("publishers"), name_field),
            metacritic_score,
            screenshots: screenshots.to_vec(),
        })
    }
}

/// Score must be a number other than zero; null, strings and absence reject.
fn metacritic_score(game: &RawItem) -> Option<Number> {
    match game.get("metacritic") {
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.clone()),
        _ => None,
    }
}

fn string_field(game: &RawItem, key: &str) -> Option<String> {
    game.get(key).and_then(Value::as_str).map(str::to_string)
}

fn name_field(entry: &Value) -> Option<&str> {
    entry.get("name")?.as_str()
}

/// RAWG nests platforms one level deeper: `{"platform": {"id": 4, "name": "PC"}}`.
fn platform_name(entry: &Value) -> Option<&str> {
    entry.get("platform")?.get("name")?.as_str()
}

/// Read a name off each nested object in source order, skipping entries where
/// the accessor finds nothing (or an empty string). Non-array input yields an
/// empty list.
pub fn extract_names<F>(entries: Option<&Value>, name_of: F) -> Vec<String>
where
    F: Fn(&Value) -> Option<&str>,
{
    entries
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| name_of(item))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
