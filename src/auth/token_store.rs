use std::sync::RwLock;

use crate::error::AppResult;
use crate::storage::{ACCESS_TOKEN_KEY, KeyValueStore};

use super::Credential;

/// Credential store: a process-memory cache in front of the persistent
/// key-value collaborator. Reads hit the cache first and fall back to
/// the collaborator on cold start; writes and clears go to both.
///
/// Publication is atomic with respect to the cache lock: a reader sees
/// either the previous credential, `None`, or the replacement, never a
/// torn state.
#[derive(Debug)]
pub struct TokenStore<S> {
    kv: S,
    cached: RwLock<Option<Credential>>,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            cached: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<Option<Credential>> {
        if let Some(credential) = self.cached.read().expect("token cache poisoned").clone() {
            return Ok(Some(credential));
        }

        let Some(raw) = self.kv.read(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };

        let credential: Credential = serde_json::from_str(&raw)?;
        let mut cached = self.cached.write().expect("token cache poisoned");
        *cached = Some(credential.clone());
        Ok(Some(credential))
    }

    pub fn set(&self, credential: &Credential) -> AppResult<()> {
        let raw = serde_json::to_string(credential)?;
        self.kv.write(ACCESS_TOKEN_KEY, &raw)?;

        let mut cached = self.cached.write().expect("token cache poisoned");
        *cached = Some(credential.clone());
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        self.kv.remove(ACCESS_TOKEN_KEY)?;

        let mut cached = self.cached.write().expect("token cache poisoned");
        *cached = None;
        Ok(())
    }
}
