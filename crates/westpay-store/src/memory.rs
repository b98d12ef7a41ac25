//! In-process store backend.
//!
//! Holds the whole document as a JSON tree behind a lock and behaves like the
//! hosted store: `null` deletes, empty objects are pruned, server timestamps
//! resolve to the local clock. Test hooks can inject failures and latency and
//! count reads.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use westpay_core::now_millis;

use crate::error::{Result, StoreError};
use crate::path::DbPath;
use crate::{is_server_timestamp, Store};

/// In-memory implementation of [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
    reads: AtomicUsize,
    faults: Mutex<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    queued: VecDeque<StoreError>,
    denied_writes: Vec<DbPath>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            ..Self::default()
        }
    }

    /// Create a store holding `document`.
    #[must_use]
    pub fn with_document(document: Value) -> Self {
        Self {
            root: RwLock::new(normalize(resolve_timestamps(document, now_millis()))),
            ..Self::default()
        }
    }

    /// A copy of the whole document.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    /// Number of `get` calls served so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Fail the next operation, of any kind, with `error`.
    pub async fn fail_next(&self, error: StoreError) {
        self.faults.lock().await.queued.push_back(error);
    }

    /// Deny every write at or below `path` with `PermissionDenied`.
    pub async fn deny_writes(&self, path: DbPath) {
        self.faults.lock().await.denied_writes.push(path);
    }

    /// Delay every operation by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.faults.lock().await.latency = Some(latency);
    }

    async fn before(&self, path: &DbPath, write: bool) -> Result<()> {
        let (latency, fault) = {
            let mut faults = self.faults.lock().await;
            let fault = faults.queued.pop_front().or_else(|| {
                (write && faults.denied_writes.iter().any(|d| is_prefix(d, path)))
                    .then(|| StoreError::PermissionDenied(format!("write to {path} denied")))
            });
            (faults.latency, fault)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        fault.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, path: &DbPath) -> Result<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.before(path, false).await?;

        let root = self.root.read().await;
        Ok(get_at(&root, path.segments()).cloned())
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        self.before(path, true).await?;

        let value = normalize(resolve_timestamps(value, now_millis()));
        let mut root = self.root.write().await;
        write_at(&mut root, path.segments(), value);
        tracing::trace!(path = %path, "Memory store write");
        Ok(())
    }

    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<()> {
        let targets = fields
            .into_iter()
            .map(|(key, value)| Ok((path.join(&key)?, value)))
            .collect::<Result<Vec<_>>>()?;
        for (target, _) in &targets {
            self.before(target, true).await?;
        }

        let now = now_millis();
        let mut root = self.root.write().await;
        for (target, value) in targets {
            write_at(&mut root, target.segments(), normalize(resolve_timestamps(value, now)));
        }
        Ok(())
    }

    async fn remove(&self, path: &DbPath) -> Result<()> {
        self.before(path, true).await?;

        let mut root = self.root.write().await;
        write_at(&mut root, path.segments(), Value::Null);
        Ok(())
    }
}

fn is_prefix(prefix: &DbPath, path: &DbPath) -> bool {
    path.segments().starts_with(prefix.segments())
}

fn is_empty(value: &Value) -> bool {
    value.is_null() || value.as_object().is_some_and(Map::is_empty)
}

fn get_at<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let found = segments
        .iter()
        .try_fold(node, |node, key| node.as_object()?.get(key))?;
    (!is_empty(found)).then_some(found)
}

/// Write `value` at `segments`, deleting when it is empty and pruning any
/// parents the deletion leaves empty.
fn write_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = if is_empty(&value) {
            Value::Object(Map::new())
        } else {
            value
        };
        return;
    };

    if is_empty(&value) {
        if let Value::Object(map) = node {
            if rest.is_empty() {
                map.remove(first);
            } else if let Some(child) = map.get_mut(first) {
                write_at(child, rest, value);
                if is_empty(child) {
                    map.remove(first);
                }
            }
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        write_at(child, rest, value);
    }
}

fn resolve_timestamps(value: Value, now: i64) -> Value {
    if is_server_timestamp(&value) {
        return Value::from(now);
    }
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, resolve_timestamps(v, now)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| resolve_timestamps(v, now))
                .collect(),
        ),
        other => other,
    }
}

/// Drop `null` children and empty objects, as the hosted store does.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}
