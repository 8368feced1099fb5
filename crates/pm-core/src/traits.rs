//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::models::{Comment, SessionUser, Story, User, Users};

/// Whole-collection persistence for stories, comments and users.
///
/// There are no partial updates: callers load a full collection, change it
/// in memory and save it back. Two overlapping cycles on the same collection
/// race and the last save wins.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Never fails. Missing or unreadable data loads as an empty list.
    async fn load_stories(&self) -> Vec<Story>;
    async fn save_stories(&self, stories: &[Story]) -> anyhow::Result<()>;

    async fn load_comments(&self) -> Vec<Comment>;
    async fn save_comments(&self, comments: &[Comment]) -> anyhow::Result<()>;

    async fn load_users(&self) -> Users;
    async fn save_users(&self, users: &Users) -> anyhow::Result<()>;
}

/// Credential and session contract.
pub trait AuthProvider: Send + Sync {
    /// Hashes a password into a self-describing string safe to persist.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never match.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed session token for the user.
    fn issue_session(&self, user: &User) -> anyhow::Result<String>;

    /// Resolves a session token, returning `None` when it is forged or expired.
    fn resolve_session(&self, token: &str) -> Option<SessionUser>;
}
