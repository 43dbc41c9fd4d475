//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in the binary (the getters also call it lazily).
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env from the working directory, falling back to the crate root.
/// Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Parse a raw optional value, keeping `default` when absent or unparsable.
pub fn parse_or<T>(raw: Option<&str>, default: T) -> T
where
    T: FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Mask values whose key looks like a credential before they reach the logs.
pub fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("KEY") || k.contains("TOKEN")
    {
        if val.is_empty() {
            return String::new();
        }
        return "***".to_string();
    }
    val.trim().to_string()
}
