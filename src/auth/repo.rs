use std::collections::{hash_map::Entry, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::auth::{errors::StoreError, repo_types::UserRecord};

/// Lookup collaborator holding every registered user, keyed by username.
pub trait CredentialStore: Send + Sync {
    /// Insert a new record. The existence check and the insert are one atomic step.
    fn put(&self, record: UserRecord) -> Result<(), StoreError>;

    /// Find a user by username.
    fn get(&self, username: &str) -> Result<UserRecord, StoreError>;

    fn contains(&self, username: &str) -> bool {
        self.get(username).is_ok()
    }
}

/// Volatile store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl CredentialStore for InMemoryStore {
    fn put(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write();
        match users.entry(record.username.clone()) {
            Entry::Occupied(taken) => Err(StoreError::AlreadyExists(taken.key().clone())),
            Entry::Vacant(slot) => {
                debug!(username = %record.username, "user stored");
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn get(&self, username: &str) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(username.to_owned()))
    }

    fn contains(&self, username: &str) -> bool {
        self.users.read().contains_key(username)
    }
}
