//! # Domain Models
//!
//! These structs represent the persisted entities of Postmortem.
//! IDs are opaque strings; new ones are UUID v7 so they sort by creation time,
//! but nothing relies on that.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single rejection story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub is_anonymous: bool,
    /// Where the rejection happened (e.g. "YC", "Techstars")
    #[serde(default)]
    pub platform: String,
    /// Cohort label, compared as an opaque string
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub rejection_reason: String,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub what_learned: String,
    #[serde(default)]
    pub advice: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub votes: u32,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// The batch label, or "" when the story has none.
    pub fn batch_label(&self) -> &str {
        self.batch.as_deref().map(str::trim).unwrap_or_default()
    }

    /// The platform without surrounding whitespace, as filtered and counted.
    pub fn platform_label(&self) -> &str {
        self.platform.trim()
    }
}

/// A comment on a story, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub story_id: String,
    /// `None` marks a top-level comment
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "anonymous")]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub votes: u32,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// The parent id, treating an empty string the same as no parent.
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// A registered account. Stored in a map keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Older files only carry the id as the map key; the store fills it in.
    #[serde(default)]
    pub id: String,
    pub username: String,
    /// PHC-formatted password hash. Never plaintext.
    pub password_hash: String,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// The persisted shape of the users collection.
pub type Users = BTreeMap<String, User>;

/// Identity carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
}

/// The three independently persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Stories,
    Comments,
    Users,
}

impl Collection {
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Stories => "stories.json",
            Collection::Comments => "comments.json",
            Collection::Users => "users.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Stories => "stories",
            Collection::Comments => "comments",
            Collection::Users => "users",
        };
        f.write_str(name)
    }
}

/// What a vote targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Comment,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Story => f.write_str("Story"),
            ItemKind::Comment => f.write_str("Comment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Applies this vote to a counter. Down votes stop at zero.
    pub fn apply(self, votes: u32) -> u32 {
        match self {
            VoteDirection::Up => votes.saturating_add(1),
            VoteDirection::Down => votes.saturating_sub(1),
        }
    }
}

/// User input for a new story, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoryDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub rejection_reason: String,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub what_learned: String,
    #[serde(default)]
    pub advice: String,
    /// Comma-separated tag list as typed into the form
    #[serde(default)]
    pub tags: String,
}

/// User input for a new comment, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub story_id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

pub(crate) fn anonymous() -> String {
    "Anonymous".to_string()
}

/// Lenient `created_at` decoding. Accepts RFC 3339 and also ISO-8601 without
/// an offset (e.g. "2024-02-01T10:00:00.123456"), which is read as UTC.
/// A missing field falls back to the field's serde default.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}
