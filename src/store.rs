//! Credential persistence used by the bootstrapper.
//!
//! The store is an opaque cache of at most one [`LocalUser`]. How and where it
//! persists (browser storage, a file, a keychain) is up to the implementor.

use std::sync::Mutex;

use crate::model::LocalUser;

/// Read/write access to the cached local identity.
pub trait CredentialStore: Send + Sync {
    /// The cached identity, if any.
    fn local_user(&self) -> Option<LocalUser>;

    /// Cache `user`, replacing any previous identity.
    fn save_user(&self, user: &LocalUser);
}

/// In-process [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    user: Mutex<Option<LocalUser>>,
}

impl MemoryCredentialStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `user`.
    pub fn with_user(user: LocalUser) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn local_user(&self) -> Option<LocalUser> {
        match self.user.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save_user(&self, user: &LocalUser) {
        let mut guard = match self.user.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(user.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_has_no_user() {
        assert!(MemoryCredentialStore::new().local_user().is_none());
    }

    #[test]
    fn save_overwrites_previous_user() {
        let store = MemoryCredentialStore::with_user(LocalUser::new("old", "t0"));
        store.save_user(&LocalUser::new("new", "t1"));
        assert_eq!(store.local_user(), Some(LocalUser::new("new", "t1")));
    }
}
