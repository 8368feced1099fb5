//! # pm-store-json
//! postmortem/crates/pm-plugins/pm-store-json/src/lib.rs
//! Flat-file implementation of `CollectionStore`.
//! One pretty-printed JSON document per collection, always read and written whole.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use pm_core::models::{Collection, Comment, Story, User, Users};
use pm_core::traits::CollectionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct JsonFileStore {
    /// Directory holding the collection files (e.g., "./data")
    root_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// "<root>/stories.json" and friends
    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.root_path.join(collection.file_name())
    }

    /// Reads a whole document. Absent, unreadable or unparseable files all
    /// come back as the empty default; the caller can't tell them apart.
    async fn read_document<T>(&self, collection: Collection) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.collection_path(collection);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%collection, path = %path.display(), "collection file absent, starting empty");
                return T::default();
            }
            Err(e) => {
                warn!(%collection, path = %path.display(), error = %e, "failed to read collection, treating as empty");
                return T::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => value,
            Err(e) => {
                // The next save will overwrite whatever was here.
                warn!(%collection, path = %path.display(), error = %e, "invalid collection JSON, treating as empty");
                T::default()
            }
        }
    }

    /// Reads a list collection one record at a time. A record that fails to
    /// decode is skipped with a warning instead of emptying the collection.
    async fn read_records<T>(&self, collection: Collection) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        let raw: Vec<Value> = self.read_document(collection).await;
        raw.into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%collection, index, error = %e, "skipping undecodable record");
                    None
                }
            })
            .collect()
    }

    /// Overwrites a whole collection via temp file + rename, so no reader
    /// sees a half-written document.
    async fn write_collection<T>(&self, collection: Collection, value: &T) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        let content = serde_json::to_vec_pretty(value)
            .with_context(|| format!("serializing {collection}"))?;

        fs::create_dir_all(&self.root_path)
            .await
            .with_context(|| format!("creating {}", self.root_path.display()))?;

        let target = self.collection_path(collection);
        let tmp = self
            .root_path
            .join(format!(".{collection}-{}.tmp", Uuid::new_v4()));

        fs::write(&tmp, &content)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("replacing {}", target.display()));
        }

        debug!(%collection, bytes = content.len(), "collection saved");
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load_stories(&self) -> Vec<Story> {
        self.read_records(Collection::Stories).await
    }

    async fn save_stories(&self, stories: &[Story]) -> anyhow::Result<()> {
        self.write_collection(Collection::Stories, stories).await
    }

    async fn load_comments(&self) -> Vec<Comment> {
        self.read_records(Collection::Comments).await
    }

    async fn save_comments(&self, comments: &[Comment]) -> anyhow::Result<()> {
        self.write_collection(Collection::Comments, comments).await
    }

    /// Records without an `id` take it from their map key.
    async fn load_users(&self) -> Users {
        let raw: BTreeMap<String, Value> = self.read_document(Collection::Users).await;
        raw.into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<User>(value) {
                Ok(mut user) => {
                    if user.id.is_empty() {
                        user.id = key.clone();
                    }
                    Some((key, user))
                }
                Err(e) => {
                    warn!(user_key = %key, error = %e, "skipping undecodable user");
                    None
                }
            })
            .collect()
    }

    async fn save_users(&self, users: &Users) -> anyhow::Result<()> {
        self.write_collection(Collection::Users, users).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pm_core::models::{ItemKind, StoryDraft, VoteDirection};
    use pm_core::service;
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        (dir, store)
    }

    fn story(id: &str) -> Story {
        Story {
            id: id.to_string(),
            title: "Rejected".to_string(),
            company_name: String::new(),
            founder_name: String::new(),
            is_anonymous: false,
            platform: "YC".to_string(),
            batch: Some("W24".to_string()),
            rejection_reason: "Too early".to_string(),
            narrative: String::new(),
            what_learned: String::new(),
            advice: String::new(),
            tags: vec!["ai".to_string()],
            votes: 2,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let (_dir, store) = setup();
        assert!(store.load_stories().await.is_empty());
        assert!(store.load_comments().await.is_empty());
        assert!(store.load_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.collection_path(Collection::Stories), "[{not json").unwrap();
        std::fs::write(store.collection_path(Collection::Users), "[]").unwrap();

        assert!(store.load_stories().await.is_empty());
        // Valid JSON of the wrong shape is treated the same way.
        assert!(store.load_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_stories() {
        let (_dir, store) = setup();
        let stories = vec![story("a"), story("b")];
        store.save_stories(&stories).await.unwrap();

        let loaded = store.load_stories().await;
        assert_eq!(loaded, stories);
    }

    #[tokio::test]
    async fn test_users_persist_as_mapping() {
        let (_dir, store) = setup();
        let mut users = Users::new();
        users.insert(
            "u1".to_string(),
            User {
                id: "u1".to_string(),
                username: "ada".to_string(),
                password_hash: "$argon2id$v=19$...".to_string(),
                created_at: Utc::now(),
            },
        );
        store.save_users(&users).await.unwrap();

        let on_disk = std::fs::read_to_string(store.collection_path(Collection::Users)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(value["u1"]["username"], "ada");
        assert_eq!(store.load_users().await, users);
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_collection_and_leaves_no_tmp() {
        let (_dir, store) = setup();
        store.save_stories(&[story("a"), story("b")]).await.unwrap();
        store.save_stories(&[story("c")]).await.unwrap();

        let ids: Vec<String> = store.load_stories().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c"]);

        for entry in std::fs::read_dir(store.root()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }

    #[tokio::test]
    async fn test_corrupt_content_is_replaced_on_next_save() {
        let (_dir, store) = setup();
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.collection_path(Collection::Stories), "garbage").unwrap();

        let mut stories = store.load_stories().await;
        stories.push(story("fresh"));
        store.save_stories(&stories).await.unwrap();

        assert_eq!(store.load_stories().await.len(), 1);
    }

    fn write_raw(store: &JsonFileStore, collection: Collection, content: &str) {
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.collection_path(collection), content).unwrap();
    }

    const LEGACY_STORIES: &str = r#"[
        {"id": "old-1", "title": "First", "platform": "YC", "rejection_reason": "Too early",
         "tags": ["ai"], "votes": 4, "created_at": "2024-02-01T10:00:00.123456"},
        {"id": "old-2", "title": "Second", "platform": "Techstars", "rejection_reason": "No traction",
         "votes": 1, "created_at": "2024-03-05T08:30:00"}
    ]"#;

    #[tokio::test]
    async fn test_legacy_stories_survive_vote_and_submit() {
        let (_dir, store) = setup();
        write_raw(&store, Collection::Stories, LEGACY_STORIES);

        let loaded = store.load_stories().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].created_at.to_rfc3339(), "2024-02-01T10:00:00.123456+00:00");

        let votes = service::cast_vote(&store, ItemKind::Story, "old-1", VoteDirection::Up)
            .await
            .unwrap();
        assert_eq!(votes, 5);

        let draft = StoryDraft {
            title: "Third".to_string(),
            platform: "YC".to_string(),
            rejection_reason: "Market".to_string(),
            ..StoryDraft::default()
        };
        service::create_story(&store, draft).await.unwrap();

        let ids: Vec<String> = store.load_stories().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(&ids[..2], ["old-1", "old-2"]);
    }

    #[tokio::test]
    async fn test_one_bad_record_does_not_empty_the_collection() {
        let (_dir, store) = setup();
        write_raw(
            &store,
            Collection::Comments,
            r#"[
                {"id": "c1", "story_id": "s1", "text": "kept", "created_at": "2024-02-01T10:00:00"},
                {"id": "c2", "story_id": "s1", "text": "bad", "created_at": "not a date"},
                {"story_id": "s1", "text": "no id"},
                {"id": "c4", "story_id": "s1", "text": "no timestamp"}
            ]"#,
        );

        let ids: Vec<String> = store.load_comments().await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c4"]);
    }

    #[tokio::test]
    async fn test_legacy_users_take_id_from_key() {
        let (_dir, store) = setup();
        write_raw(
            &store,
            Collection::Users,
            r#"{"uid-1": {"username": "ada", "password_hash": "$argon2id$v=19$x"}}"#,
        );

        let users = store.load_users().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users["uid-1"].id, "uid-1");
        assert_eq!(users["uid-1"].username, "ada");

        store.save_users(&users).await.unwrap();
        let on_disk = std::fs::read_to_string(store.collection_path(Collection::Users)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(value["uid-1"]["id"], "uid-1");
    }
}
