//! User lookup seam
//!
//! The auth flows resolve a token subject to a [`User`] through
//! [`UserRepository`]. Persistent storage lives outside this crate; the
//! in-memory implementation here backs the binary and the tests.

use std::future::Future;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// User record as seen by the auth flows
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Login name, also used as the token subject
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user (no password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Resolves token subjects to users
pub trait UserRepository: Send + Sync + 'static {
    fn get_by_subject(
        &self,
        subject: &str,
    ) -> impl Future<Output = Result<Option<User>, UserRepositoryError>> + Send;
}

/// Process-local user store keyed by username
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user, rejecting duplicate usernames
    pub fn insert(&self, user: User) -> Result<(), UserRepositoryError> {
        use dashmap::mapref::entry::Entry;

        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(UserRepositoryError::UsernameAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    pub fn remove(&self, username: &str) -> Option<User> {
        self.users.remove(username).map(|(_, user)| user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn get_by_subject(&self, subject: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.users.get(subject).map(|entry| entry.value().clone()))
    }
}
