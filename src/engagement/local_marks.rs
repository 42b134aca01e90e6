//! Visitor-local key/value storage and the like marks kept in it.
//!
//! Marks are a cache of what this visitor did. The store is authoritative.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// String key/value storage owned by one visitor.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryLocalStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("Local storage lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Local storage persisted as one JSON object, rewritten on every change.
pub struct JsonFileLocalStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl JsonFileLocalStorage {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read local state {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse local state {:?}", path))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}

impl LocalStorage for JsonFileLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("Local storage lock poisoned"))?;
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist(&items) {
            match previous {
                Some(v) => items.insert(key.to_string(), v),
                None => items.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

/// Per-review "liked by me" flags, stored as `liked_review_{id}` = "1"/"0".
#[derive(Clone)]
pub struct LocalLikeMarks {
    storage: Arc<dyn LocalStorage>,
}

impl LocalLikeMarks {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    fn key(review_id: &str) -> String {
        format!("liked_review_{}", review_id)
    }

    pub fn is_liked(&self, review_id: &str) -> bool {
        self.storage.get_item(&Self::key(review_id)).as_deref() == Some("1")
    }

    pub fn set_liked(&self, review_id: &str, liked: bool) -> Result<()> {
        self.storage
            .set_item(&Self::key(review_id), if liked { "1" } else { "0" })
    }
}
