//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The in-memory [`Store`] is authoritative for reads. When a database pool
//! is configured, mutations are written through to Postgres and the store
//! is hydrated from it at startup.

use std::collections::HashMap;
use std::sync::Arc;

use notes_core::{Note, NoteId};
use parking_lot::RwLock;
use sqlx::PgPool;

use crate::auth::{TokenIssuer, UserDirectory};
use crate::config::AppConfig;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory store keyed by [`NoteId`].
///
/// The lock is `parking_lot` and is never held across `.await`. The `_if`
/// variants evaluate their predicate and perform the mutation under a
/// single write lock, so a check can never go stale before the write.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<NoteId, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: NoteId, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record that satisfies `pred`.
    pub fn get_if(&self, id: &NoteId, pred: impl FnOnce(&T) -> bool) -> Option<T> {
        self.data.read().get(id).filter(|v| pred(*v)).cloned()
    }

    /// All records that satisfy `pred`, in arbitrary order.
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(*v))
            .cloned()
            .collect()
    }

    /// Check `pred` and mutate under one write lock.
    ///
    /// Returns `(before, after)`, or `None` if the record is absent or fails
    /// the predicate.
    pub fn update_if(
        &self,
        id: &NoteId,
        pred: impl FnOnce(&T) -> bool,
        f: impl FnOnce(&mut T),
    ) -> Option<(T, T)> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        if !pred(&*entry) {
            return None;
        }
        let before = entry.clone();
        f(&mut *entry);
        Some((before, entry.clone()))
    }

    /// Check `pred` and remove under one write lock.
    pub fn remove_if(&self, id: &NoteId, pred: impl FnOnce(&T) -> bool) -> Option<T> {
        let mut guard = self.data.write();
        if guard.get(id).is_some_and(pred) {
            guard.remove(id)
        } else {
            None
        }
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync + PartialEq> Store<T> {
    /// Put `previous` back if the record still equals `expected`.
    ///
    /// Used to undo an update whose persistence failed without clobbering a
    /// later write that already replaced it.
    pub fn restore_if_unchanged(&self, id: NoteId, expected: &T, previous: T) -> bool {
        let mut guard = self.data.write();
        match guard.get_mut(&id) {
            Some(current) if current == expected => {
                *current = previous;
                true
            }
            _ => false,
        }
    }

    /// Re-insert a removed record unless the id has been reused.
    pub fn restore_removed(&self, id: NoteId, previous: T) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&id) {
            return false;
        }
        guard.insert(id, previous);
        true
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub notes: Store<Note>,
    pub tokens: TokenIssuer,
    pub users: Arc<UserDirectory>,
    pub config: AppConfig,
    /// Postgres pool. `None` runs in-memory only.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Build state from configuration and an optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        Self {
            notes: Store::new(),
            tokens,
            users: Arc::new(config.users.clone()),
            config,
            db_pool,
        }
    }

    /// Load persisted notes into the in-memory store.
    ///
    /// Returns the number of notes loaded. A no-op without a database.
    pub async fn hydrate_from_db(&self) -> Result<usize, sqlx::Error> {
        let Some(pool) = &self.db_pool else {
            return Ok(0);
        };
        let notes = crate::db::notes::load_all(pool).await?;
        let count = notes.len();
        for note in notes {
            self.notes.insert(note.id(), note);
        }
        tracing::info!(notes = count, "hydrated note store from database");
        Ok(count)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(values: &[(NoteId, u32)]) -> Store<u32> {
        let store = Store::new();
        for (id, v) in values {
            store.insert(*id, *v);
        }
        store
    }

    #[test]
    fn get_if_applies_predicate() {
        let id = NoteId::new();
        let store = store_with(&[(id, 7)]);
        assert_eq!(store.get_if(&id, |v| *v == 7), Some(7));
        assert_eq!(store.get_if(&id, |v| *v == 8), None);
        assert_eq!(store.get_if(&NoteId::new(), |_| true), None);
    }

    #[test]
    fn update_if_skips_failing_predicate() {
        let id = NoteId::new();
        let store = store_with(&[(id, 1)]);
        assert!(store.update_if(&id, |v| *v == 2, |v| *v += 10).is_none());
        assert_eq!(store.get_if(&id, |_| true), Some(1));
        assert_eq!(store.update_if(&id, |v| *v == 1, |v| *v += 10), Some((1, 11)));
    }

    #[test]
    fn remove_if_skips_failing_predicate() {
        let id = NoteId::new();
        let store = store_with(&[(id, 1)]);
        assert!(store.remove_if(&id, |v| *v == 2).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove_if(&id, |v| *v == 1), Some(1));
        assert!(store.is_empty());
    }

    #[test]
    fn filter_returns_matching_values() {
        let store = store_with(&[(NoteId::new(), 1), (NoteId::new(), 2), (NoteId::new(), 3)]);
        let mut odd = store.filter(|v| v % 2 == 1);
        odd.sort();
        assert_eq!(odd, vec![1, 3]);
    }

    #[test]
    fn restore_if_unchanged_respects_later_writes() {
        let id = NoteId::new();
        let store = store_with(&[(id, 5)]);
        assert!(store.restore_if_unchanged(id, &5, 4));
        assert_eq!(store.get_if(&id, |_| true), Some(4));
        assert!(!store.restore_if_unchanged(id, &5, 3));
        assert_eq!(store.get_if(&id, |_| true), Some(4));
    }

    #[test]
    fn restore_removed_only_fills_gaps() {
        let id = NoteId::new();
        let store: Store<u32> = Store::new();
        assert!(store.restore_removed(id, 1));
        assert!(!store.restore_removed(id, 2));
        assert_eq!(store.get_if(&id, |_| true), Some(1));
    }

    #[test]
    fn app_state_defaults_to_in_memory() {
        let state = AppState::new();
        assert!(state.db_pool.is_none());
        assert!(state.notes.is_empty());
    }

    #[tokio::test]
    async fn hydrate_without_database_is_noop() {
        assert_eq!(AppState::new().hydrate_from_db().await.unwrap(), 0);
    }
}
