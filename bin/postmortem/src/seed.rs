//! Sample stories written into an empty data directory on startup.

use chrono::{Duration, Utc};
use pm_core::models::Story;
use pm_core::traits::CollectionStore;
use tracing::info;
use uuid::Uuid;

struct Sample {
    title: &'static str,
    company: &'static str,
    founder: &'static str,
    anonymous: bool,
    platform: &'static str,
    batch: Option<&'static str>,
    reason: &'static str,
    narrative: &'static str,
    learned: &'static str,
    advice: &'static str,
    tags: &'static [&'static str],
    votes: u32,
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Rejected after a 10 minute interview that went sideways",
        company: "Ledgerly",
        founder: "Priya N.",
        anonymous: false,
        platform: "YC",
        batch: Some("W24"),
        reason: "Market too small",
        narrative: "We spent most of the interview defending our TAM slide instead of talking about the customers we already had.",
        learned: "Lead with traction. The market argument lands better when it comes from real usage.",
        advice: "Practice the first two minutes until they are boring to you.",
        tags: &["fintech", "b2b"],
        votes: 42,
    },
    Sample {
        title: "Two solo applications, two rejections, then a co-founder",
        company: "",
        founder: "",
        anonymous: true,
        platform: "YC",
        batch: Some("S23"),
        reason: "Solo founder",
        narrative: "Both times the feedback pointed at execution risk with a single founder. We shipped the same product with a partner the next cycle.",
        learned: "Team shape is part of the pitch whether you like it or not.",
        advice: "If you are solo, show exactly how you cover the gaps.",
        tags: &["ai", "devtools"],
        votes: 31,
    },
    Sample {
        title: "Techstars said we were too early",
        company: "Fieldnote",
        founder: "Marco D.",
        anonymous: false,
        platform: "Techstars",
        batch: None,
        reason: "Too early",
        narrative: "We applied with a prototype and a waitlist. The partners liked the space but wanted paying users.",
        learned: "A waitlist is not demand. Ten paying customers would have changed the conversation.",
        advice: "Charge something, even if it is small.",
        tags: &["saas", "productivity"],
        votes: 18,
    },
    Sample {
        title: "No traction, no interview",
        company: "",
        founder: "",
        anonymous: true,
        platform: "a16z speedrun",
        batch: None,
        reason: "No traction",
        narrative: "Application went in with a landing page and a demo video. Rejection email arrived nine days later.",
        learned: "Programs this competitive filter on numbers before they read the story.",
        advice: "Apply when you have a chart that goes up and to the right.",
        tags: &["consumer", "gaming"],
        votes: 9,
    },
    Sample {
        title: "Interviewers did not believe the unit economics",
        company: "Parcelbox",
        founder: "Jen L.",
        anonymous: false,
        platform: "YC",
        batch: Some("W24"),
        reason: "Unit economics",
        narrative: "Hardware plus logistics made every margin question harder. We had answers but not proof.",
        learned: "Bring the spreadsheet and know every cell by heart.",
        advice: "Show a cohort that is already profitable, even a tiny one.",
        tags: &["hardware", "logistics"],
        votes: 25,
    },
];

fn sample_stories() -> Vec<Story> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .enumerate()
        .map(|(age, s)| Story {
            id: Uuid::now_v7().to_string(),
            title: s.title.to_string(),
            company_name: s.company.to_string(),
            founder_name: s.founder.to_string(),
            is_anonymous: s.anonymous,
            platform: s.platform.to_string(),
            batch: s.batch.map(str::to_string),
            rejection_reason: s.reason.to_string(),
            narrative: s.narrative.to_string(),
            what_learned: s.learned.to_string(),
            advice: s.advice.to_string(),
            tags: s.tags.iter().map(|t| t.to_string()).collect(),
            votes: s.votes,
            created_at: now - Duration::days(age as i64),
        })
        .collect()
}

/// Writes the sample stories when the store has none. Returns how many were written.
pub async fn seed_if_empty(store: &dyn CollectionStore) -> anyhow::Result<usize> {
    if !store.load_stories().await.is_empty() {
        return Ok(0);
    }

    let stories = sample_stories();
    store.save_stories(&stories).await?;
    info!(count = stories.len(), "seeded empty store with sample stories");
    Ok(stories.len())
}
