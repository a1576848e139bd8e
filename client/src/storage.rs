//! Secure on-device storage seam. The host application supplies the real
//! backing (keychain, keystore, encrypted prefs); this crate only needs an
//! opaque key-value get/set/delete capability.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::ClientError;

pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const CURRENT_USER: &str = "current_user";
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn delete(&self, key: &str) -> Result<(), ClientError>;
}

/// In-memory store for tests and platforms without secure storage.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let items = self
            .items
            .lock()
            .map_err(|_| ClientError::Storage("store lock poisoned".into()))?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ClientError::Storage("store lock poisoned".into()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ClientError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ClientError::Storage("store lock poisoned".into()))?;
        items.remove(key);
        Ok(())
    }
}
