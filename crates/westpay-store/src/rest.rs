//! REST backend for the hosted realtime store.
//!
//! Every path maps to `{base_url}/{path}.json`, each segment percent-encoded. Reads are `GET`, replacements
//! `PUT`, multi-location updates `PATCH` and deletes `DELETE`. An auth token,
//! when configured, travels as the `auth` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::path::DbPath;
use crate::Store;

/// Error body returned by the hosted store.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST-backed implementation of [`Store`].
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl RestStore {
    /// Create a store client for the database at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if `base_url` is not a usable URL,
    /// or `StoreError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, RestOptions::default())
    }

    /// Create a store client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if `base_url` is not a usable URL,
    /// or `StoreError::Network` if the HTTP client cannot be built.
    pub fn with_options(base_url: impl Into<String>, options: RestOptions) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| StoreError::InvalidPath(format!("base URL {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::InvalidPath(format!("base URL {base_url:?} cannot hold a path")));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            auth_token: options.auth_token,
        })
    }

    fn url(&self, path: &DbPath) -> Result<Url> {
        let (last, parents) = match path.segments().split_last() {
            Some((last, parents)) => (format!("{last}.json"), parents),
            None => (".json".to_string(), &[][..]),
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidPath(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(parents)
            .push(&last);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, method: &'static str, path: &DbPath, request: RequestBuilder) -> Result<Value> {
        tracing::debug!(method, path = %path, "Store request");

        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::warn!(method, path = %path, error = %e, "Store request failed");
            StoreError::from(e)
        })?;

        self.handle_response(response).await
    }

    /// Handle a store response and convert errors.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
            s if s.is_server_error() => StoreError::Network(message),
            s => StoreError::Api {
                status: s.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Store for RestStore {
    async fn get(&self, path: &DbPath) -> Result<Option<Value>> {
        let value = self.send("GET", path, self.client.get(self.url(path)?)).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        if value.is_null() {
            return self.remove(path).await;
        }
        self.send("PUT", path, self.client.put(self.url(path)?).json(&value))
            .await
            .map(drop)
    }

    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<()> {
        for key in fields.keys() {
            path.join(key)?;
        }
        self.send("PATCH", path, self.client.patch(self.url(path)?).json(&fields))
            .await
            .map(drop)
    }

    async fn remove(&self, path: &DbPath) -> Result<()> {
        self.send("DELETE", path, self.client.delete(self.url(path)?))
            .await
            .map(drop)
    }
}

/// Options for [`RestStore`].
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Database secret or ID token sent as the `auth` parameter.
    pub auth_token: Option<String>,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            auth_token: None,
        }
    }
}

impl RestOptions {
    /// Create options with an auth token.
    #[must_use]
    pub fn with_auth_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            ..Self::default()
        }
    }
}
