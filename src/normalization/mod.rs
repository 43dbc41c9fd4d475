//! Turning RAWG payloads into backend records.
pub mod game;
pub mod genres;
pub mod sanitize;
