use super::local_marks::LocalStorage;
use anyhow::Result;
use std::fmt;
use tracing::debug;

const VISITOR_ID_KEY: &str = "anonymous_visitor_id";

/// Random identifier for a visitor, created once and kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousVisitorId(String);

impl AnonymousVisitorId {
    pub fn load_or_create(storage: &dyn LocalStorage) -> Result<Self> {
        if let Some(id) = storage.get_item(VISITOR_ID_KEY) {
            let id = id.trim();
            if !id.is_empty() {
                return Ok(Self(id.to_string()));
            }
        }
        let id = uuid::Uuid::new_v4().to_string();
        storage.set_item(VISITOR_ID_KEY, &id)?;
        debug!("Created anonymous visitor id {}", id);
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonymousVisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
