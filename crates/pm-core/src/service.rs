//! # Services
//!
//! Mutating operations. Each one is a full load-modify-save cycle against a
//! [`CollectionStore`] with no locking: concurrent calls on the same
//! collection race and the last save wins.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    anonymous, Comment, CommentDraft, ItemKind, Story, StoryDraft, User, VoteDirection,
};
use crate::traits::{AuthProvider, CollectionStore};

/// Applies one vote and returns the item's new count.
pub async fn cast_vote(
    store: &dyn CollectionStore,
    kind: ItemKind,
    id: &str,
    direction: VoteDirection,
) -> Result<u32> {
    let votes = match kind {
        ItemKind::Story => {
            let mut stories = store.load_stories().await;
            let story = stories
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| AppError::not_found(kind, id))?;
            story.votes = direction.apply(story.votes);
            let votes = story.votes;
            store.save_stories(&stories).await.map_err(save_failed)?;
            votes
        }
        ItemKind::Comment => {
            let mut comments = store.load_comments().await;
            let comment = comments
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| AppError::not_found(kind, id))?;
            comment.votes = direction.apply(comment.votes);
            let votes = comment.votes;
            store.save_comments(&comments).await.map_err(save_failed)?;
            votes
        }
    };
    Ok(votes)
}

/// Validates a draft and appends it as a new story.
pub async fn create_story(store: &dyn CollectionStore, draft: StoryDraft) -> Result<Story> {
    let title = required(&draft.title, "title")?;
    let platform = required(&draft.platform, "platform")?;
    let rejection_reason = required(&draft.rejection_reason, "rejection reason")?;

    let (company_name, founder_name) = if draft.is_anonymous {
        (String::new(), String::new())
    } else {
        (
            draft.company_name.trim().to_string(),
            draft.founder_name.trim().to_string(),
        )
    };
    let batch = Some(draft.batch.trim())
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    let mut stories = store.load_stories().await;
    let story = Story {
        id: fresh_id(|candidate| stories.iter().any(|s| s.id == candidate)),
        title,
        company_name,
        founder_name,
        is_anonymous: draft.is_anonymous,
        platform,
        batch,
        rejection_reason,
        narrative: draft.narrative.trim().to_string(),
        what_learned: draft.what_learned.trim().to_string(),
        advice: draft.advice.trim().to_string(),
        tags: parse_tags(&draft.tags),
        votes: 0,
        created_at: Utc::now(),
    };

    stories.push(story.clone());
    store.save_stories(&stories).await.map_err(save_failed)?;

    info!(story_id = %story.id, platform = %story.platform, "story created");
    Ok(story)
}

/// Validates a draft and appends it as a new comment.
///
/// The referenced story and parent are not checked for existence.
pub async fn add_comment(store: &dyn CollectionStore, draft: CommentDraft) -> Result<Comment> {
    let story_id = required(&draft.story_id, "story_id")?;
    let text = required(&draft.text, "text")?;
    let author = match draft.author.trim() {
        "" => anonymous(),
        name => name.to_string(),
    };
    let parent_id = draft
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let mut comments = store.load_comments().await;
    let comment = Comment {
        id: fresh_id(|candidate| comments.iter().any(|c| c.id == candidate)),
        story_id,
        parent_id,
        author,
        text,
        votes: 0,
        created_at: Utc::now(),
    };

    comments.push(comment.clone());
    store.save_comments(&comments).await.map_err(save_failed)?;

    info!(comment_id = %comment.id, story_id = %comment.story_id, "comment added");
    Ok(comment)
}

/// Registers a new account with a hashed password.
pub async fn register_user(
    store: &dyn CollectionStore,
    auth: &dyn AuthProvider,
    username: &str,
    password: &str,
    min_password_len: usize,
) -> Result<User> {
    let username = required(username, "username")?;
    if password.chars().count() < min_password_len {
        return Err(AppError::validation(format!(
            "password must be at least {min_password_len} characters"
        )));
    }

    let mut users = store.load_users().await;
    if users.values().any(|u| u.username == username) {
        return Err(AppError::validation("username already exists"));
    }

    let user = User {
        id: fresh_id(|candidate| users.contains_key(candidate)),
        username,
        password_hash: auth.hash_password(password)?,
        created_at: Utc::now(),
    };

    users.insert(user.id.clone(), user.clone());
    store.save_users(&users).await.map_err(save_failed)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials, returning the matching account.
pub async fn authenticate(
    store: &dyn CollectionStore,
    auth: &dyn AuthProvider,
    username: &str,
    password: &str,
) -> Result<User> {
    let users = store.load_users().await;
    users
        .into_values()
        .find(|u| u.username == username.trim() && auth.verify_password(password, &u.password_hash))
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))
}

/// Splits a comma-separated tag list. Blank entries and repeats are dropped;
/// the first occurrence keeps its position.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn required(value: &str, field: &str) -> Result<String> {
    match value.trim() {
        "" => Err(AppError::validation(format!("{field} is required"))),
        v => Ok(v.to_string()),
    }
}

fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::now_v7().to_string();
        if !taken(&id) {
            return id;
        }
    }
}

fn save_failed(err: anyhow::Error) -> AppError {
    error!(error = %err, "failed to persist collection");
    AppError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use crate::traits::MockCollectionStore;
    use crate::models::SessionUser;

    /// Reversible stand-in so tests don't pay for real password hashing.
    struct PlainAuth;

    impl AuthProvider for PlainAuth {
        fn hash_password(&self, password: &str) -> anyhow::Result<String> {
            Ok(format!("plain${password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> bool {
            hash == format!("plain${password}")
        }

        fn issue_session(&self, user: &User) -> anyhow::Result<String> {
            Ok(user.id.clone())
        }

        fn resolve_session(&self, _token: &str) -> Option<SessionUser> {
            None
        }
    }

    fn draft(title: &str, platform: &str) -> StoryDraft {
        StoryDraft {
            title: title.to_string(),
            platform: platform.to_string(),
            rejection_reason: "Too early".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_story_appends_one_with_unique_id() {
        let store = MemoryStore::default();
        let first = create_story(&store, draft("First", "YC")).await.unwrap();
        let before = store.load_stories().await;

        let second = create_story(&store, draft("Second", "YC")).await.unwrap();
        let after = store.load_stories().await;

        assert_eq!(after.len(), before.len() + 1);
        assert_ne!(first.id, second.id);
        assert!(before.iter().all(|s| s.id != second.id));
        assert_eq!(second.votes, 0);
    }

    #[tokio::test]
    async fn test_create_story_normalizes_fields() {
        let store = MemoryStore::default();
        let story = create_story(
            &store,
            StoryDraft {
                company_name: "Acme".into(),
                founder_name: "Ada".into(),
                is_anonymous: true,
                batch: "   ".into(),
                tags: "ai, , saas,ai ,b2b".into(),
                ..draft("  Title  ", "YC")
            },
        )
        .await
        .unwrap();

        assert_eq!(story.title, "Title");
        assert!(story.company_name.is_empty());
        assert!(story.founder_name.is_empty());
        assert_eq!(story.batch, None);
        assert_eq!(story.tags, vec!["ai", "saas", "b2b"]);
    }

    #[tokio::test]
    async fn test_create_story_requires_core_fields() {
        let store = MemoryStore::default();
        let err = create_story(&store, draft("", "YC")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = create_story(&store, draft("Title", "  ")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(store.load_stories().await.is_empty());
    }

    #[tokio::test]
    async fn test_votes_floor_at_zero() {
        let store = MemoryStore::default();
        let story = create_story(&store, draft("A", "YC")).await.unwrap();

        let sequence = [
            VoteDirection::Down,
            VoteDirection::Up,
            VoteDirection::Down,
            VoteDirection::Down,
            VoteDirection::Up,
            VoteDirection::Up,
        ];
        let mut expected: i64 = 0;
        for direction in sequence {
            expected = match direction {
                VoteDirection::Up => expected + 1,
                VoteDirection::Down => (expected - 1).max(0),
            };
            let votes = cast_vote(&store, ItemKind::Story, &story.id, direction)
                .await
                .unwrap();
            assert_eq!(i64::from(votes), expected);
        }
        assert_eq!(store.load_stories().await[0].votes, 2);
    }

    #[tokio::test]
    async fn test_vote_on_comment() {
        let store = MemoryStore::default();
        let comment = add_comment(
            &store,
            CommentDraft {
                story_id: "s1".into(),
                text: "hi".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let votes = cast_vote(&store, ItemKind::Comment, &comment.id, VoteDirection::Up)
            .await
            .unwrap();
        assert_eq!(votes, 1);
    }

    #[tokio::test]
    async fn test_vote_unknown_id_is_not_found_and_writes_nothing() {
        let mut store = MockCollectionStore::new();
        store.expect_load_stories().returning(Vec::new);
        store.expect_save_stories().never();

        let err = cast_vote(&store, ItemKind::Story, "nope", VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, id) if kind == "Story" && id == "nope"));
    }

    #[tokio::test]
    async fn test_save_failure_is_internal() {
        let mut store = MockCollectionStore::new();
        store.expect_load_comments().returning(Vec::new);
        store
            .expect_save_comments()
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let err = add_comment(
            &store,
            CommentDraft {
                story_id: "s1".into(),
                text: "hello".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("disk full")));
    }

    #[tokio::test]
    async fn test_add_comment_defaults_and_validation() {
        let store = MemoryStore::default();
        let comment = add_comment(
            &store,
            CommentDraft {
                story_id: "s1".into(),
                author: "  ".into(),
                text: " nice ".into(),
                parent_id: Some(String::new()),
            },
        )
        .await
        .unwrap();
        assert_eq!(comment.author, "Anonymous");
        assert_eq!(comment.text, "nice");
        assert_eq!(comment.parent_id, None);

        let missing_text = CommentDraft {
            story_id: "s1".into(),
            ..Default::default()
        };
        assert!(matches!(
            add_comment(&store, missing_text).await,
            Err(AppError::ValidationError(_))
        ));

        let missing_story = CommentDraft {
            text: "orphan".into(),
            ..Default::default()
        };
        assert!(matches!(
            add_comment(&store, missing_story).await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(store.load_comments().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let store = MemoryStore::default();
        let user = register_user(&store, &PlainAuth, "ada", "correct horse", 8)
            .await
            .unwrap();
        assert_ne!(user.password_hash, "correct horse");

        let found = authenticate(&store, &PlainAuth, "ada", "correct horse")
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        let err = authenticate(&store, &PlainAuth, "ada", "wrong password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = authenticate(&store, &PlainAuth, "nobody", "correct horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_short_passwords() {
        let store = MemoryStore::default();
        register_user(&store, &PlainAuth, "ada", "long enough", 8)
            .await
            .unwrap();

        let dup = register_user(&store, &PlainAuth, "ada", "another one", 8).await;
        assert!(matches!(dup, Err(AppError::ValidationError(msg)) if msg.contains("exists")));

        let short = register_user(&store, &PlainAuth, "bob", "short", 8).await;
        assert!(matches!(short, Err(AppError::ValidationError(_))));

        assert_eq!(store.load_users().await.len(), 1);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags(" a ,b,,a"), vec!["a", "b"]);
    }
}
