//! # Comment Threads
//!
//! Groups a story's comments into a reply tree. Rebuilt on every request.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::models::Comment;

#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    /// Comments without a parent, most votes first
    pub top_level: Vec<Comment>,
    /// Replies keyed by parent id, oldest first
    pub replies: HashMap<String, Vec<Comment>>,
}

/// A comment positioned for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadedComment {
    pub comment: Comment,
    /// 0 for top-level comments
    pub depth: usize,
}

impl CommentThread {
    /// Builds the thread for `story_id` out of the whole comments collection.
    ///
    /// Replies whose parent is missing stay in `replies` and are never reached
    /// from `top_level`.
    pub fn build(comments: &[Comment], story_id: &str) -> Self {
        let mut top_level = Vec::new();
        let mut replies: HashMap<String, Vec<Comment>> = HashMap::new();

        for comment in comments.iter().filter(|c| c.story_id == story_id) {
            match comment.parent() {
                Some(parent) => replies
                    .entry(parent.to_string())
                    .or_default()
                    .push(comment.clone()),
                None => top_level.push(comment.clone()),
            }
        }

        top_level.sort_by_key(|c| Reverse(c.votes));
        for list in replies.values_mut() {
            list.sort_by_key(|c| c.created_at);
        }

        Self { top_level, replies }
    }

    pub fn replies_to(&self, comment_id: &str) -> &[Comment] {
        self.replies
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of comments reachable from the top level.
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
    }

    /// Depth-first display order. Each comment is emitted at most once, so a
    /// parent cycle in stored data cannot loop forever.
    pub fn flatten(&self) -> Vec<ThreadedComment> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(&Comment, usize)> =
            self.top_level.iter().rev().map(|c| (c, 0)).collect();

        while let Some((comment, depth)) = stack.pop() {
            if !seen.insert(comment.id.as_str()) {
                continue;
            }
            out.push(ThreadedComment {
                comment: comment.clone(),
                depth,
            });
            for reply in self.replies_to(&comment.id).iter().rev() {
                stack.push((reply, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn comment(id: &str, story: &str, parent: Option<&str>, votes: u32, minutes: i64) -> Comment {
        Comment {
            id: id.to_string(),
            story_id: story.to_string(),
            parent_id: parent.map(str::to_string),
            author: "Anonymous".to_string(),
            text: format!("comment {id}"),
            votes,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_partition_and_ordering() {
        let comments = vec![
            comment("a", "s1", None, 1, 0),
            comment("b", "s1", None, 4, 1),
            comment("r2", "s1", Some("a"), 9, 5),
            comment("r1", "s1", Some("a"), 0, 2),
            comment("x", "s2", None, 10, 0),
        ];

        let thread = CommentThread::build(&comments, "s1");
        let top: Vec<&str> = thread.top_level.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["b", "a"]);

        let replies: Vec<&str> = thread.replies_to("a").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(replies, vec!["r1", "r2"]);
        assert!(thread.replies_to("b").is_empty());
    }

    #[test]
    fn test_reply_with_existing_parent_is_never_top_level() {
        let comments = vec![
            comment("p", "s1", None, 0, 0),
            comment("c", "s1", Some("p"), 100, 1),
            comment("empty-parent", "s1", Some(""), 0, 2),
        ];
        let thread = CommentThread::build(&comments, "s1");

        assert!(thread.top_level.iter().all(|c| c.id != "c"));
        assert!(thread.top_level.iter().any(|c| c.id == "empty-parent"));
    }

    #[test]
    fn test_flatten_depth_first() {
        let comments = vec![
            comment("a", "s1", None, 2, 0),
            comment("b", "s1", None, 1, 1),
            comment("a1", "s1", Some("a"), 0, 2),
            comment("a1x", "s1", Some("a1"), 0, 3),
            comment("a2", "s1", Some("a"), 0, 4),
        ];
        let flat = CommentThread::build(&comments, "s1").flatten();
        let order: Vec<(&str, usize)> = flat
            .iter()
            .map(|t| (t.comment.id.as_str(), t.depth))
            .collect();
        assert_eq!(
            order,
            vec![("a", 0), ("a1", 1), ("a1x", 2), ("a2", 1), ("b", 0)]
        );
    }

    #[test]
    fn test_flatten_survives_cycles_and_skips_orphans() {
        let comments = vec![
            comment("a", "s1", None, 0, 0),
            comment("b", "s1", Some("a"), 0, 1),
            // "a" listed again as a reply to "b" via a duplicate id
            comment("a", "s1", Some("b"), 0, 2),
            comment("orphan", "s1", Some("missing"), 0, 3),
        ];
        let thread = CommentThread::build(&comments, "s1");
        let flat = thread.flatten();
        let ids: Vec<&str> = flat.iter().map(|t| t.comment.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(thread.len(), 2);
    }
}
