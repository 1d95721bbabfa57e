//! In-memory key-value store with clock-driven expiry.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::session::{
    error::{StoreError, StoreResult},
    ports::KeyValueStore,
};

/// Thread-safe in-memory store.
///
/// Expiry is evaluated against the injected clock on every access, so tests
/// can advance time deterministically.
pub struct InMemoryKeyValueStore<C: Clock + Send + Sync> {
    state: Arc<RwLock<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
    clock: Arc<C>,
}

// `DefaultClock` is not `Clone`; clones share the clock instead.
impl<C: Clock + Send + Sync> Clone for InMemoryKeyValueStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            unavailable: Arc::clone(&self.unavailable),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync> std::fmt::Debug for InMemoryKeyValueStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKeyValueStore")
            .field("unavailable", &self.unavailable.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Set(BTreeSet<String>),
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

impl<C: Clock + Send + Sync> InMemoryKeyValueStore<C> {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("connection refused"));
        }
        Ok(())
    }

    fn expiry(&self, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
        let delta = TimeDelta::from_std(ttl?).ok()?;
        self.clock.utc().checked_add_signed(delta)
    }

    fn read_live<T>(
        &self,
        key: &str,
        read: impl FnOnce(&Stored) -> StoreResult<T>,
    ) -> StoreResult<Option<T>> {
        self.ensure_reachable()?;
        let state = self
            .state
            .read()
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        let now = self.clock.utc();
        state
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| read(&entry.value))
            .transpose()
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> KeyValueStore for InMemoryKeyValueStore<C> {
    async fn set_add(&self, key: &str, member: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        self.ensure_reachable()?;
        let now = self.clock.utc();
        let expires_at = self.expiry(ttl);
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        if state.get(key).is_some_and(|entry| !entry.is_live(now)) {
            state.remove(key);
        }
        let entry = state.entry(key.to_owned()).or_insert_with(|| Entry {
            value: Stored::Set(BTreeSet::new()),
            expires_at,
        });
        let Stored::Set(members) = &mut entry.value else {
            return Err(StoreError::WrongType(key.to_owned()));
        };
        let inserted = members.insert(member.to_owned());
        entry.expires_at = expires_at;
        Ok(inserted)
    }

    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        let members = self.read_live(key, |stored| match stored {
            Stored::Set(members) => Ok(members.clone()),
            Stored::Text(_) => Err(StoreError::WrongType(key.to_owned())),
        })?;
        Ok(members.unwrap_or_default())
    }

    async fn set_contains(&self, key: &str, member: &str) -> StoreResult<bool> {
        let found = self.read_live(key, |stored| match stored {
            Stored::Set(members) => Ok(members.contains(member)),
            Stored::Text(_) => Err(StoreError::WrongType(key.to_owned())),
        })?;
        Ok(found.unwrap_or(false))
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.ensure_reachable()?;
        let expires_at = self.expiry(ttl);
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        state.insert(
            key.to_owned(),
            Entry {
                value: Stored::Text(value.to_owned()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.read_live(key, |stored| match stored {
            Stored::Text(text) => Ok(text.clone()),
            Stored::Set(_) => Err(StoreError::WrongType(key.to_owned())),
        })
    }
}
