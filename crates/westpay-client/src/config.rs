//! Client configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the hosted realtime store.
    pub database_url: String,

    /// Database secret or ID token sent with every request (optional).
    pub auth_token: Option<String>,

    /// Web API key of the hosted project (optional, informational).
    pub api_key: Option<String>,

    /// File backing local storage; `None` keeps it in memory.
    pub local_storage_path: Option<String>,

    /// How long a cached wallet balance counts as fresh, in milliseconds.
    pub balance_cache_ms: u64,

    /// Retries after the first attempt for message writes.
    pub message_max_retries: u32,

    /// Fixed delay between message write retries, in milliseconds.
    pub message_retry_delay_ms: u64,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Hosted store secrets file structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseSecrets {
    #[serde(rename = "databaseURL")]
    database_url: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let (database_url, api_key, auth_token) = load_firebase_secrets();

        Self {
            database_url: database_url.unwrap_or(defaults.database_url),
            auth_token,
            api_key,
            local_storage_path: std::env::var("WESTPAY_LOCAL_STORAGE").ok(),
            balance_cache_ms: env_parse("BALANCE_CACHE_MS").unwrap_or(defaults.balance_cache_ms),
            message_max_retries: env_parse("MESSAGE_MAX_RETRIES")
                .unwrap_or(defaults.message_max_retries),
            message_retry_delay_ms: env_parse("MESSAGE_RETRY_DELAY_MS")
                .unwrap_or(defaults.message_retry_delay_ms),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }

    /// Freshness window of the balance cache.
    #[must_use]
    pub const fn balance_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.balance_cache_ms)
    }

    /// Retry policy for message writes.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.message_max_retries)
            .with_backoff(Backoff::Fixed(Duration::from_millis(
                self.message_retry_delay_ms,
            )))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Load hosted store secrets from file or environment.
fn load_firebase_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/firebase.json",
        "westpay/.secrets/firebase.json",
        "../.secrets/firebase.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<FirebaseSecrets>(path) {
            tracing::info!(path = %path, "Loaded store secrets from file");
            return (
                Some(secrets.database_url),
                secrets.api_key,
                secrets.auth_token,
            );
        }
    }

    tracing::debug!("Store secrets file not found, using environment variables");
    (
        std::env::var("WESTPAY_DATABASE_URL").ok(),
        std::env::var("WESTPAY_API_KEY").ok(),
        std::env::var("WESTPAY_AUTH_TOKEN").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: "https://westernpayer-default-rtdb.firebaseio.com".into(),
            auth_token: None,
            api_key: None,
            local_storage_path: None,
            balance_cache_ms: 5_000,
            message_max_retries: 3,
            message_retry_delay_ms: 1_000,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.balance_cache_ttl(), Duration::from_secs(5));

        let retry = config.retry_policy();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.backoff, Backoff::Fixed(Duration::from_secs(1)));
    }

    #[test]
    fn secrets_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "databaseURL": "https://example-rtdb.firebaseio.com", "apiKey": "k" }}"#
        )
        .unwrap();

        let secrets: FirebaseSecrets =
            load_secrets_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(secrets.database_url, "https://example-rtdb.firebaseio.com");
        assert_eq!(secrets.api_key.as_deref(), Some("k"));
        assert_eq!(secrets.auth_token, None);
    }

    #[test]
    fn missing_secrets_file() {
        let err = load_secrets_file::<FirebaseSecrets>("/nonexistent/firebase.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
