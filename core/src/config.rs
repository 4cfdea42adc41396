//! Store configuration.
//!
//! The remote endpoint differs per environment, so it is read once at the
//! composition root and handed to the store as an opaque string.

/// Environment variable holding the todo collection endpoint.
pub const BASE_URL_ENV: &str = "TODO_API_URL";

/// Endpoint used when `TODO_API_URL` is unset or blank. Matches the mock
/// server's default bind address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/todos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
