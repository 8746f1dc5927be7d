//! # In-Memory Transient Store
//!
//! A [`TransientStore`] kept in process memory, with expiry driven by an
//! injected [`Clock`]. Suitable for single-process deployments and tests;
//! multi-worker deployments should plug in a shared store instead.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use super::store::TransientStore;
use crate::time::{clock::Clock, system_clock::SystemClock};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

pub struct MemoryTransientStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryTransientStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryTransientStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, e| !is_expired(e, now));
        Ok(before - entries.len())
    }

    /// Number of stored entries, expired ones included until read or purged.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("transient store lock poisoned"))
    }
}

fn is_expired(entry: &Entry, now: DateTime<Utc>) -> bool {
    entry.expires_at.is_some_and(|at| at <= now)
}

impl TransientStore for MemoryTransientStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            Some(e) => is_expired(e, now),
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(self.clock.now() + chrono::Duration::from_std(ttl)?),
            None => None,
        };
        self.lock()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
