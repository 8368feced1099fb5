//! # pm-ui
//!
//! askama templates and the view structs they render. Templates live in
//! `crates/pm-ui/templates/` and are compiled into the binary.

use askama::Template;
use pm_core::feed::{FeedStats, PlatformCount, ReasonCount};
use pm_core::models::{Comment, Story};
use pm_core::thread::ThreadedComment;

/// Fields every page shares through `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub site_name: String,
    /// Logged-in username, or "" for visitors
    pub viewer: String,
}

impl Chrome {
    pub fn is_logged_in(&self) -> bool {
        !self.viewer.is_empty()
    }
}

/// A story in the feed with its discussion size.
#[derive(Debug, Clone)]
pub struct StoryRow {
    pub story: Story,
    pub comment_count: usize,
}

impl StoryRow {
    pub fn posted_on(&self) -> String {
        self.story.created_at.format("%b %-d, %Y").to_string()
    }
}

/// A comment indented for its position in the thread.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub comment: Comment,
    pub indent_px: usize,
}

impl From<ThreadedComment> for CommentRow {
    fn from(threaded: ThreadedComment) -> Self {
        Self {
            indent_px: threaded.depth.min(6) * 24,
            comment: threaded.comment,
        }
    }
}

impl CommentRow {
    pub fn posted_at(&self) -> String {
        self.comment.created_at.format("%b %-d, %Y %H:%M").to_string()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: Chrome,
    pub rows: Vec<StoryRow>,
    pub platforms: Vec<String>,
    pub tags: Vec<String>,
    pub batches: Vec<String>,
    pub sort: String,
    pub platform_filter: String,
    pub tag_filter: String,
    pub batch_filter: String,
    pub search_query: String,
}

#[derive(Template)]
#[template(path = "story.html")]
pub struct StoryTemplate {
    pub chrome: Chrome,
    pub story: Story,
    pub comments: Vec<CommentRow>,
}

impl StoryTemplate {
    pub fn posted_on(&self) -> String {
        self.story.created_at.format("%B %-d, %Y").to_string()
    }
}

/// Values echoed back into the submit form after a validation error.
#[derive(Debug, Clone, Default)]
pub struct SubmitValues {
    pub title: String,
    pub company_name: String,
    pub founder_name: String,
    pub is_anonymous: bool,
    pub platform: String,
    pub batch: String,
    pub rejection_reason: String,
    pub narrative: String,
    pub what_learned: String,
    pub advice: String,
    pub tags: String,
}

#[derive(Template)]
#[template(path = "submit.html")]
pub struct SubmitTemplate {
    pub chrome: Chrome,
    pub values: SubmitValues,
    pub error: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub min_password_len: usize,
    pub error: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub chrome: Chrome,
    pub totals: FeedStats,
    pub reasons: Vec<ReasonCount>,
    pub platforms: Vec<PlatformCount>,
    pub tags: Vec<String>,
    pub batches: Vec<String>,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub chrome: Chrome,
}
