//! Environment variable parsing helpers shared by pool configuration

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when unset or malformed
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a required environment variable
pub fn require_env(key: &str) -> Result<String, String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{key} environment variable not set")),
    }
}
