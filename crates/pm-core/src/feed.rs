//! # Feed
//!
//! Pure views over a loaded stories collection: sorting, filtering and the
//! aggregates shown on the index and stats pages. Every query is a linear
//! scan over the whole collection.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use crate::models::{Comment, Story};

/// Number of rejection reasons kept by [`rejection_reasons`].
pub const TOP_REASONS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most votes first
    #[default]
    Top,
    /// Most recent first
    New,
}

impl SortOrder {
    /// Parses the `sort` query parameter. Anything but "new" means top.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("new") => SortOrder::New,
            _ => SortOrder::Top,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Top => "top",
            SortOrder::New => "new",
        }
    }
}

/// Conjunctive story filter. A `None` field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    pub platform: Option<String>,
    pub batch: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive substring searched across the text fields
    pub query: Option<String>,
}

impl StoryFilter {
    /// Builds a filter from raw query parameters, dropping blank values.
    pub fn from_params(
        platform: Option<&str>,
        batch: Option<&str>,
        tag: Option<&str>,
        query: Option<&str>,
    ) -> Self {
        fn keep(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            platform: keep(platform),
            batch: keep(batch),
            tag: keep(tag),
            query: keep(query).map(|q| q.to_lowercase()),
        }
    }

    pub fn matches(&self, story: &Story) -> bool {
        if let Some(platform) = &self.platform {
            if story.platform_label() != platform.as_str() {
                return false;
            }
        }
        if let Some(batch) = &self.batch {
            if story.batch_label() != batch.as_str() {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !story.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(query) = &self.query {
            let searchable = [
                &story.title,
                &story.narrative,
                &story.what_learned,
                &story.company_name,
                &story.founder_name,
            ];
            if !searchable
                .iter()
                .any(|field| field.to_lowercase().contains(query.as_str()))
            {
                return false;
            }
        }
        true
    }
}

/// Stable sort in place. Equal keys keep their collection order.
pub fn sort_stories(stories: &mut [Story], order: SortOrder) {
    match order {
        SortOrder::Top => stories.sort_by_key(|s| Reverse(s.votes)),
        SortOrder::New => stories.sort_by_key(|s| Reverse(s.created_at)),
    }
}

/// Filters then sorts, returning owned copies for rendering.
pub fn select_stories(stories: &[Story], filter: &StoryFilter, order: SortOrder) -> Vec<Story> {
    let mut selected: Vec<Story> = stories
        .iter()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect();
    sort_stories(&mut selected, order);
    selected
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
    /// Share of all stories, rounded to the nearest integer
    pub percent: u32,
}

/// Rejection-reason histogram, most common first, truncated to [`TOP_REASONS`].
///
/// Percentages are taken against every story, including those without a
/// reason, so they can sum to less than 100.
pub fn rejection_reasons(stories: &[Story]) -> Vec<ReasonCount> {
    let total = stories.len();
    let counts = count_in_order(stories.iter().map(|s| s.rejection_reason.trim()));

    counts
        .into_iter()
        .take(TOP_REASONS)
        .map(|(reason, count)| ReasonCount {
            percent: percent_of(count, total),
            reason: reason.to_string(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCount {
    pub platform: String,
    pub count: usize,
}

/// Platform histogram, most common first, untruncated.
pub fn platform_counts(stories: &[Story]) -> Vec<PlatformCount> {
    count_in_order(stories.iter().map(Story::platform_label))
        .into_iter()
        .map(|(platform, count)| PlatformCount {
            platform: platform.to_string(),
            count,
        })
        .collect()
}

/// Every tag in use, ascending.
pub fn distinct_tags(stories: &[Story]) -> Vec<String> {
    stories
        .iter()
        .flat_map(|s| s.tags.iter())
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every batch label in use, descending.
///
/// Labels are opaque strings, so "W24" sorts after "S24": this is
/// lexicographic, not chronological.
pub fn distinct_batches(stories: &[Story]) -> Vec<String> {
    let batches: BTreeSet<&str> = stories
        .iter()
        .map(Story::batch_label)
        .filter(|b| !b.is_empty())
        .collect();
    batches.into_iter().rev().map(str::to_string).collect()
}

/// Every platform in use, ascending.
pub fn distinct_platforms(stories: &[Story]) -> Vec<String> {
    stories
        .iter()
        .map(Story::platform_label)
        .filter(|p| !p.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Number of comments per story id.
pub fn comment_counts(comments: &[Comment]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for comment in comments {
        *counts.entry(comment.story_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Headline totals for the stats page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub stories: usize,
    pub comments: usize,
    pub votes: u64,
}

impl FeedStats {
    pub fn collect(stories: &[Story], comments: &[Comment]) -> Self {
        Self {
            stories: stories.len(),
            comments: comments.len(),
            votes: stories.iter().map(|s| u64::from(s.votes)).sum(),
        }
    }
}

/// round(count / total * 100), with an empty total giving 0.
pub fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Counts non-empty keys, ordered by count descending. Ties keep the order
/// in which keys first appeared.
fn count_in_order<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for key in keys.filter(|k| !k.is_empty()) {
        let slot = *slots.entry(key).or_insert_with(|| {
            counts.push((key, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    counts.sort_by_key(|&(_, count)| Reverse(count));
    counts
}
