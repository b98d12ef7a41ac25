//! Hosted realtime store access for WestPay.
//!
//! The site keeps all of its state in one hierarchical JSON document. This
//! crate provides the [`Store`] trait for path-based reads and writes, with
//! two backends:
//!
//! - [`MemoryStore`]: an in-process JSON tree, used by tests and local tools
//! - [`RestStore`]: the hosted store's REST interface over `reqwest`
//!
//! # Layout
//!
//! - `users/{uid}`: profile, wallet, payment/withdrawal requests, notifications
//! - `orders/{uid}/{pushId}`: orders
//! - `contactMessages/{pushId}`: contact and support messages
//! - `adminMessages/{emailKey}/{pushId}`: messages for unregistered recipients
//! - `productReviews/{productId}/reviews/{pushId}`: product reviews
//!
//! # Example
//!
//! ```no_run
//! use westpay_store::{DbPath, MemoryStore, StoreExt};
//! use westpay_core::{UserId, UserProfile};
//!
//! # async fn example() -> westpay_store::Result<()> {
//! let store = MemoryStore::new();
//! let uid = UserId::new("kX9fQ2aB")?;
//!
//! store.set_as(&DbPath::profile(&uid), &UserProfile::new("Asha", "asha@mail.in")).await?;
//! let profile: Option<UserProfile> = store.get_as(&DbPath::profile(&uid)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod path;
pub mod rest;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use path::DbPath;
pub use rest::{RestOptions, RestStore};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use westpay_core::PushKey;

/// Placeholder the store replaces with its own clock, in epoch milliseconds.
#[must_use]
pub fn server_timestamp() -> Value {
    serde_json::json!({ ".sv": "timestamp" })
}

/// Whether `value` is the server timestamp placeholder.
#[must_use]
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.get(".sv").and_then(Value::as_str) == Some("timestamp"))
}

/// Path-based access to the hosted store.
///
/// Implementations own no application state. There is no cross-path
/// atomicity: callers that read and then write a value (the wallet balance,
/// most notably) race with other writers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the value at `path`.
    ///
    /// Returns `None` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or denies the read.
    async fn get(&self, path: &DbPath) -> Result<Option<Value>>;

    /// Replace the value at `path`. Writing `null` deletes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or denies the write.
    async fn set(&self, path: &DbPath, value: Value) -> Result<()>;

    /// Write several children of `path` at once. Keys may be nested
    /// relative paths such as `profile/isBlocked`.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a valid path or the write fails.
    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<()>;

    /// Delete the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or denies the write.
    async fn remove(&self, path: &DbPath) -> Result<()>;

    /// Write `value` under a freshly generated push key and return the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn push(&self, path: &DbPath, value: Value) -> Result<PushKey> {
        let key = PushKey::generate();
        self.set(&path.child(key.as_str())?, value).await?;
        Ok(key)
    }
}

/// Typed helpers over [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    /// Read and deserialize the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the value has the wrong shape.
    async fn get_as<T: DeserializeOwned + Send>(&self, path: &DbPath) -> Result<Option<T>> {
        self.get(path)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Serialize and write `value` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    async fn set_as<T: Serialize + Sync>(&self, path: &DbPath, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(path, value).await
    }

    /// Read every child of the collection at `path`, keyed by push key.
    ///
    /// Children that do not deserialize are skipped with a warning, so one
    /// malformed record does not hide the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn list_as<T: DeserializeOwned + Send>(&self, path: &DbPath) -> Result<Vec<(String, T)>> {
        let Some(Value::Object(children)) = self.get(path).await? else {
            return Ok(Vec::new());
        };

        let mut items = Vec::with_capacity(children.len());
        for (key, value) in children {
            match serde_json::from_value(value) {
                Ok(item) => items.push((key, item)),
                Err(e) => {
                    tracing::warn!(path = %path, key = %key, error = %e, "Skipping malformed record");
                }
            }
        }
        Ok(items)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
