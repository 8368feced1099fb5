//! postmortem/crates/pm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Postmortem.

pub mod error;
pub mod feed;
pub mod models;
pub mod service;
pub mod thread;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_story_loads_with_missing_optional_fields() {
        let raw = r#"{
            "id": "legacy-1",
            "title": "Rejected twice",
            "platform": "YC",
            "batch": "",
            "created_at": "2024-02-01T10:00:00Z"
        }"#;
        let story: Story = serde_json::from_str(raw).unwrap();
        assert_eq!(story.votes, 0);
        assert!(story.tags.is_empty());
        assert_eq!(story.batch_label(), "");
    }

    #[test]
    fn test_vote_request_wire_names() {
        let kind: ItemKind = serde_json::from_str("\"comment\"").unwrap();
        let direction: VoteDirection = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(kind, ItemKind::Comment);
        assert_eq!(direction.apply(0), 0);
        assert_eq!(VoteDirection::Up.apply(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_comment_author_defaults_to_anonymous() {
        let raw = r#"{"id":"c1","story_id":"s1","created_at":"2024-02-01T10:00:00Z"}"#;
        let comment: Comment = serde_json::from_str(raw).unwrap();
        assert_eq!(comment.author, "Anonymous");
        assert_eq!(comment.parent(), None);
    }

    #[test]
    fn test_offsetless_timestamps_read_as_utc() {
        let raw = r#"{"id":"old-1","title":"Legacy","created_at":"2024-02-01T10:00:00.123456"}"#;
        let story: Story = serde_json::from_str(raw).unwrap();
        assert_eq!(story.created_at.to_rfc3339(), "2024-02-01T10:00:00.123456+00:00");

        let whole_seconds = timestamp::parse("2024-02-01T10:00:00").unwrap();
        let with_offset = timestamp::parse("2024-02-01T12:00:00+02:00").unwrap();
        assert_eq!(whole_seconds, with_offset);
        assert!(timestamp::parse("last tuesday").is_none());
    }

    #[test]
    fn test_missing_created_at_still_loads() {
        let raw = r#"{"id":"c1","story_id":"s1","text":"hi"}"#;
        let comment: Comment = serde_json::from_str(raw).unwrap();
        assert_eq!(comment.created_at, chrono::DateTime::<chrono::Utc>::default());
    }

    #[test]
    fn test_user_record_without_id() {
        let raw = r#"{"username":"ada","password_hash":"$argon2id$v=19$x"}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.id, "");
        assert_eq!(user.username, "ada");
    }
}
