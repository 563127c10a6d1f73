//! JSON persistence on top of the browser's `localStorage`.
//!
//! [`PersistedStorage`] binds to a single key and never surfaces an error to
//! its caller: a missing backend, a failed write or corrupt JSON are logged
//! and turned into "nothing stored".

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;
use crate::state::is_truthy;

/// Synchronous key-value storage, shaped after the Web Storage API.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage backend.
///
/// Used on native targets and in tests. Counts calls to the write primitive
/// so callers can check that no write happened.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_item` calls seen so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store a raw string, bypassing JSON encoding and the write counter.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Raw string currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// `window.localStorage`, looked up on every call.
///
/// `web_sys::Storage` is not `Send`, so the handle itself is never stored.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageBackend for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                message: format!("{:?}", e),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: format!("{:?}", e),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: format!("{:?}", e),
            })
    }
}

/// The browser's `localStorage`, if this environment has one.
///
/// Always `None` off the web.
pub fn browser_backend() -> Option<Arc<dyn StorageBackend>> {
    #[cfg(target_arch = "wasm32")]
    {
        if BrowserStorage::storage().is_ok() {
            return Some(Arc::new(BrowserStorage));
        }
    }
    None
}

/// JSON value persisted under one storage key.
#[derive(Clone)]
pub struct PersistedStorage {
    key: String,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl PersistedStorage {
    /// Bind `key` in the browser's `localStorage`.
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_backend(key, browser_backend())
    }

    /// Bind `key` in an explicit backend.
    ///
    /// Passing `None` yields an inert adapter: the failure is logged here,
    /// once, and every later call is a no-op.
    pub fn with_backend(key: impl Into<String>, backend: Option<Arc<dyn StorageBackend>>) -> Self {
        let key = key.into();
        if backend.is_none() {
            log::error!("[PersistedStorage] {} (key '{}')", StorageError::Unavailable, key);
        }
        Self { key, backend }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a backend is attached.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Read and parse the stored JSON.
    ///
    /// Returns `None` for a missing key, an inert adapter, a failed read or
    /// corrupt JSON.
    pub fn get(&self) -> Option<Value> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get_item(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::error!("[PersistedStorage::get] {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(source) => {
                let e = StorageError::Corrupt {
                    key: self.key.clone(),
                    source,
                };
                log::error!("[PersistedStorage::get] {}", e);
                None
            }
        }
    }

    /// Read the stored JSON and decode it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Option<T> {
        let value = self.get()?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                log::error!("[PersistedStorage::get_as] key '{}': {}", self.key, e);
                None
            }
        }
    }

    /// Serialize `data` to JSON and store it.
    ///
    /// Falsy values (`null`, `false`, `0`, `""`) are skipped without touching
    /// the backend. Returns whether a write went through.
    pub fn set<T: Serialize + ?Sized>(&self, data: &T) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(source) => {
                let e = StorageError::Serialize {
                    key: self.key.clone(),
                    source,
                };
                log::error!("[PersistedStorage::set] {}", e);
                return false;
            }
        };
        if !is_truthy(&value) {
            return false;
        }
        match backend.set_item(&self.key, &value.to_string()) {
            Ok(()) => true,
            Err(e) => {
                log::error!("[PersistedStorage::set] {}", e);
                false
            }
        }
    }

    /// Remove the key. Returns whether the removal went through.
    pub fn clear(&self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        match backend.remove_item(&self.key) {
            Ok(()) => true,
            Err(e) => {
                log::error!("[PersistedStorage::clear] {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for PersistedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStorage")
            .field("key", &self.key)
            .field("available", &self.is_available())
            .finish()
    }
}

/// Read the JSON stored under `key` in browser storage.
pub fn get_storage(key: &str) -> Option<Value> {
    PersistedStorage::new(key).get()
}

/// Store `data` as JSON under `key` in browser storage.
pub fn set_storage<T: Serialize + ?Sized>(key: &str, data: &T) -> bool {
    PersistedStorage::new(key).set(data)
}
