use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::storage::{StorageError, TokenStorage};

/// Fixed key the token is stored under
pub const TOKEN_KEY: &str = "token";

/// The single active bearer token, mirrored between durable storage and the
/// in-memory value the transport attaches to requests.
///
/// Writes go through one lock and touch storage first, so a reader never
/// sees the in-memory token disagree with what was persisted.
pub struct TokenSlot {
    storage: Arc<dyn TokenStorage>,
    current: RwLock<Option<String>>,
}

impl TokenSlot {
    /// Rehydrate from storage. An unreadable store counts as "no token".
    pub fn load(storage: Arc<dyn TokenStorage>) -> Self {
        let current = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, starting unauthenticated");
                None
            }
        };
        debug!(has_token = current.is_some(), "Token slot loaded");
        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().unwrap_or_else(|e| e.into_inner()).is_none()
    }

    /// Replace the active token. On a storage failure nothing changes.
    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        self.storage.set(TOKEN_KEY, token)?;
        *current = Some(token.to_string());
        Ok(())
    }

    /// Drop the active token. Always empties the in-memory value; a storage
    /// failure is logged.
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.storage.clear(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove stored token");
        }
        *current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;

    #[test]
    fn test_load_rehydrates_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc").unwrap();

        let slot = TokenSlot::load(storage);
        assert_eq!(slot.get().as_deref(), Some("abc"));
    }

    #[test]
    fn test_load_treats_empty_value_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "").unwrap();
        assert!(TokenSlot::load(storage).is_empty());
    }

    #[test]
    fn test_unavailable_storage_degrades_to_empty() {
        let slot = TokenSlot::load(Arc::new(MemoryStorage::unavailable()));
        assert!(slot.is_empty());

        // A failed write leaves the slot untouched
        assert!(slot.set("abc").is_err());
        assert!(slot.is_empty());

        // Clearing still succeeds locally
        slot.clear();
        assert!(slot.is_empty());
    }

    #[test]
    fn test_set_supersedes_and_clear_removes_everywhere() {
        let storage = Arc::new(MemoryStorage::new());
        let slot = TokenSlot::load(storage.clone());

        slot.set("first").unwrap();
        slot.set("second").unwrap();
        assert_eq!(slot.get().as_deref(), Some("second"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("second"));

        slot.clear();
        assert!(slot.is_empty());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }
}
