use crate::errors::DashboardError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// String values under fixed keys, scoped to one browser session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DashboardError>;
    async fn insert(&self, key: &str, value: String) -> Result<(), DashboardError>;
    /// Removes and returns the previous value.
    async fn remove(&self, key: &str) -> Result<Option<String>, DashboardError>;
}

/// In-process store for tools and tests. Clones share the same session.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, DashboardError> {
        self.values
            .lock()
            .map_err(|_| DashboardError::InternalError(anyhow::anyhow!("session store lock poisoned")))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DashboardError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn insert(&self, key: &str, value: String) -> Result<(), DashboardError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<String>, DashboardError> {
        Ok(self.lock()?.remove(key))
    }
}

#[async_trait]
impl SessionStore for tower_sessions::Session {
    async fn get(&self, key: &str) -> Result<Option<String>, DashboardError> {
        Ok(tower_sessions::Session::get::<String>(self, key).await?)
    }

    async fn insert(&self, key: &str, value: String) -> Result<(), DashboardError> {
        tower_sessions::Session::insert(self, key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<String>, DashboardError> {
        Ok(tower_sessions::Session::remove::<String>(self, key).await?)
    }
}
