//! Injected key-value storage for user state (recent symbols, settings).
//!
//! The analysis pipeline never touches a store; callers read and write user
//! state around it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store value for {namespace}/{key}: {source}")]
    Value {
        namespace: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Namespaced JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError>;
    /// Returns the removed value, if any.
    fn remove(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;
    /// Keys of `namespace` in sorted order.
    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError>;
}

type Namespaces = BTreeMap<String, BTreeMap<String, Value>>;

fn lookup(data: &Namespaces, namespace: &str, key: &str) -> Option<Value> {
    data.get(namespace).and_then(|ns| ns.get(key)).cloned()
}

fn take(data: &mut Namespaces, namespace: &str, key: &str) -> Option<Value> {
    let ns = data.get_mut(namespace)?;
    let removed = ns.remove(key);
    if ns.is_empty() {
        data.remove(namespace);
    }
    removed
}

fn list_keys(data: &Namespaces, namespace: &str) -> Vec<String> {
    data.get(namespace)
        .map(|ns| ns.keys().cloned().collect())
        .unwrap_or_default()
}

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Namespaces>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lookup(&data, namespace, key))
    }

    fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        Ok(take(&mut data, namespace, key))
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(list_keys(&data, namespace))
    }
}

/// Whole store kept in one pretty-printed JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Namespaces>,
}

impl JsonFileStore {
    /// Open `path`. A missing or corrupt file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring corrupt store {}: {e}", path.display());
                Namespaces::new()
            }),
            Err(_) => Namespaces::new(),
        };
        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates parent directories if needed.
    fn save(&self, data: &Namespaces) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(lookup(&data, namespace, key))
    }

    fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.save(&data)
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let removed = take(&mut data, namespace, key);
        if removed.is_some() {
            self.save(&data)?;
        }
        Ok(removed)
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(list_keys(&data, namespace))
    }
}

/// Typed read. A value of the wrong shape is an error, not `None`.
pub fn get_json<T, S>(store: &S, namespace: &str, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    store
        .get(namespace, key)?
        .map(|value| {
            serde_json::from_value(value).map_err(|source| StoreError::Value {
                namespace: namespace.to_string(),
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

pub fn set_json<T, S>(store: &S, namespace: &str, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    store.set(namespace, key, serde_json::to_value(value)?)
}

/// Most-recent-first list of analyzed symbols, without duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentSymbols {
    capacity: usize,
}

impl Default for RecentSymbols {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

impl RecentSymbols {
    pub const NAMESPACE: &'static str = "recent";
    const KEY: &'static str = "symbols";

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Stored list; a missing or unreadable entry reads as empty.
    pub fn list<S: KeyValueStore + ?Sized>(&self, store: &S) -> Vec<String> {
        match get_json::<Vec<String>, S>(store, Self::NAMESPACE, Self::KEY) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                log::warn!("recent symbols unreadable: {e}");
                Vec::new()
            }
        }
    }

    /// Move `symbol` to the front, dropping the oldest beyond capacity.
    pub fn push<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        symbol: &str,
    ) -> Result<Vec<String>, StoreError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let mut list = self.list(store);
        list.retain(|s| *s != symbol);
        list.insert(0, symbol);
        list.truncate(self.capacity);
        set_json(store, Self::NAMESPACE, Self::KEY, &list)?;
        Ok(list)
    }

    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        store.remove(Self::NAMESPACE, Self::KEY).map(|_| ())
    }
}
