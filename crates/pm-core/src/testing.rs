//! In-memory [`CollectionStore`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{Comment, Story, Users};
use crate::traits::CollectionStore;

/// Keeps each collection in memory. Saves replace the whole collection,
/// matching the file-backed store.
#[derive(Default)]
pub struct MemoryStore {
    stories: Mutex<Vec<Story>>,
    comments: Mutex<Vec<Comment>>,
    users: Mutex<Users>,
}

impl MemoryStore {
    pub fn with_stories(stories: Vec<Story>) -> Self {
        Self {
            stories: Mutex::new(stories),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load_stories(&self) -> Vec<Story> {
        self.stories.lock().map(|s| s.clone()).unwrap_or_default()
    }

    async fn save_stories(&self, stories: &[Story]) -> anyhow::Result<()> {
        let mut guard = self
            .stories
            .lock()
            .map_err(|_| anyhow::anyhow!("stories lock poisoned"))?;
        *guard = stories.to_vec();
        Ok(())
    }

    async fn load_comments(&self) -> Vec<Comment> {
        self.comments.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn save_comments(&self, comments: &[Comment]) -> anyhow::Result<()> {
        let mut guard = self
            .comments
            .lock()
            .map_err(|_| anyhow::anyhow!("comments lock poisoned"))?;
        *guard = comments.to_vec();
        Ok(())
    }

    async fn load_users(&self) -> Users {
        self.users.lock().map(|u| u.clone()).unwrap_or_default()
    }

    async fn save_users(&self, users: &Users) -> anyhow::Result<()> {
        let mut guard = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("users lock poisoned"))?;
        *guard = users.clone();
        Ok(())
    }
}
