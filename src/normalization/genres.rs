use std::collections::BTreeSet;

/// Genre names accepted by the games backend schema.
pub const DEFAULT_ALLOWED_GENRES: [&str; 10] = [
    "Action",
    "Adventure",
    "Indie",
    "Massively Multiplayer",
    "Platformer",
    "Puzzle",
    "RPG",
    "Racing",
    "Shooter",
    "Sports",
];

/// Closed set of genre names a game may carry to be forwarded.
///
/// Matching is exact (case-sensitive), the same way the backend maps names to
/// its enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedGenres {
    names: BTreeSet<String>,
}

impl Default for AllowedGenres {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_GENRES)
    }
}

impl AllowedGenres {
    /// Build from any list of names; blank entries are ignored and names are trimmed.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Parse a comma-separated list such as `ALLOWED_GENRES=Action,RPG`.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.names.contains(genre)
    }

    /// True when the list is non-empty and every entry is allowed.
    pub fn accepts_all(&self, genres: &[String]) -> bool {
        !genres.is_empty() && genres.iter().all(|g| self.contains(g))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
