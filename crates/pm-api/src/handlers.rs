//! # pm-api Handlers
//!
//! This module coordinates the flow between HTTP requests, the store and the
//! templates for every HTML page.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use pm_core::error::AppError;
use pm_core::feed::{self, FeedStats, SortOrder, StoryFilter};
use pm_core::models::StoryDraft;
use pm_core::service;
use pm_core::thread::CommentThread;
use pm_ui::{
    Chrome, CommentRow, IndexTemplate, LoginTemplate, NotFoundTemplate, RegisterTemplate,
    StatsTemplate, StoryRow, StoryTemplate, SubmitTemplate, SubmitValues,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::session::{cleared_session_cookie, session_cookie, Viewer};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub sort: Option<String>,
    pub platform: Option<String>,
    pub tag: Option<String>,
    pub batch: Option<String>,
    pub q: Option<String>,
}

/// Renders the story feed (e.g., /?sort=new&platform=YC)
pub async fn index(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, ApiError> {
    let stories = state.store.load_stories().await;
    let comments = state.store.load_comments().await;

    let order = SortOrder::from_param(params.sort.as_deref());
    let filter = StoryFilter::from_params(
        params.platform.as_deref(),
        params.batch.as_deref(),
        params.tag.as_deref(),
        params.q.as_deref(),
    );

    let counts = feed::comment_counts(&comments);
    let rows = feed::select_stories(&stories, &filter, order)
        .into_iter()
        .map(|story| StoryRow {
            comment_count: counts.get(&story.id).copied().unwrap_or(0),
            story,
        })
        .collect();

    render(&IndexTemplate {
        chrome: chrome(&state, &viewer),
        rows,
        platforms: feed::distinct_platforms(&stories),
        tags: feed::distinct_tags(&stories),
        batches: feed::distinct_batches(&stories),
        sort: order.as_str().to_string(),
        platform_filter: filter.platform.unwrap_or_default(),
        tag_filter: filter.tag.unwrap_or_default(),
        batch_filter: filter.batch.unwrap_or_default(),
        search_query: params.q.unwrap_or_default(),
    })
}

/// Renders a story with its threaded discussion (e.g., /story/<id>)
pub async fn view_story(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(story_id): Path<String>,
) -> Result<Response, ApiError> {
    let stories = state.store.load_stories().await;
    let Some(story) = stories.into_iter().find(|s| s.id == story_id) else {
        return not_found_page(&state, &viewer);
    };

    let comments = state.store.load_comments().await;
    let thread = CommentThread::build(&comments, &story.id);

    let html = render(&StoryTemplate {
        chrome: chrome(&state, &viewer),
        story,
        comments: thread.flatten().into_iter().map(CommentRow::from).collect(),
    })?;
    Ok(html.into_response())
}

pub async fn submit_form(State(state): State<AppState>, viewer: Viewer) -> Result<Response, ApiError> {
    if state.options.require_login_to_submit && !viewer.is_logged_in() {
        return Ok(Redirect::to("/login").into_response());
    }

    let html = render(&SubmitTemplate {
        chrome: chrome(&state, &viewer),
        values: SubmitValues::default(),
        error: String::new(),
    })?;
    Ok(html.into_response())
}

/// Checkbox-friendly mirror of [`StoryDraft`]: browsers send "on"/"true"
/// for a ticked box and nothing otherwise.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub is_anonymous: Option<String>,
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
    #[serde(default)]
    pub tags: String,
}

impl SubmitForm {
    fn is_anonymous(&self) -> bool {
        matches!(self.is_anonymous.as_deref(), Some("on" | "true" | "1"))
    }

    fn into_values(self) -> SubmitValues {
        SubmitValues {
            is_anonymous: self.is_anonymous(),
            title: self.title,
            company_name: self.company_name,
            founder_name: self.founder_name,
            platform: self.platform,
            batch: self.batch,
            rejection_reason: self.rejection_reason,
            narrative: self.narrative,
            what_learned: self.what_learned,
            advice: self.advice,
            tags: self.tags,
        }
    }
}

fn story_draft_from(v: &SubmitValues) -> StoryDraft {
    StoryDraft {
        title: v.title.clone(),
        company_name: v.company_name.clone(),
        founder_name: v.founder_name.clone(),
        is_anonymous: v.is_anonymous,
        platform: v.platform.clone(),
        batch: v.batch.clone(),
        rejection_reason: v.rejection_reason.clone(),
        narrative: v.narrative.clone(),
        what_learned: v.what_learned.clone(),
        advice: v.advice.clone(),
        tags: v.tags.clone(),
    }
}

/// Creates a story and redirects to it. Validation errors re-render the form.
pub async fn submit_story(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<SubmitForm>,
) -> Result<Response, ApiError> {
    if state.options.require_login_to_submit && !viewer.is_logged_in() {
        return Ok(Redirect::to("/login").into_response());
    }

    let values = form.into_values();
    match service::create_story(state.store.as_ref(), story_draft_from(&values)).await {
        Ok(story) => Ok(Redirect::to(&format!("/story/{}", story.id)).into_response()),
        Err(AppError::ValidationError(msg)) => {
            let html = render(&SubmitTemplate {
                chrome: chrome(&state, &viewer),
                values,
                error: msg,
            })?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Aggregates across the whole collection (e.g., /stats)
pub async fn stats(State(state): State<AppState>, viewer: Viewer) -> Result<Html<String>, ApiError> {
    let stories = state.store.load_stories().await;
    let comments = state.store.load_comments().await;

    render(&StatsTemplate {
        chrome: chrome(&state, &viewer),
        totals: FeedStats::collect(&stories, &comments),
        reasons: feed::rejection_reasons(&stories),
        platforms: feed::platform_counts(&stories),
        tags: feed::distinct_tags(&stories),
        batches: feed::distinct_batches(&stories),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register_form(State(state): State<AppState>, viewer: Viewer) -> Result<Html<String>, ApiError> {
    render(&RegisterTemplate {
        chrome: chrome(&state, &viewer),
        username: String::new(),
        min_password_len: state.options.min_password_len,
        error: String::new(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let result = service::register_user(
        state.store.as_ref(),
        state.auth.as_ref(),
        &form.username,
        &form.password,
        state.options.min_password_len,
    )
    .await;

    match result {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(AppError::ValidationError(msg)) => {
            let html = render(&RegisterTemplate {
                chrome: chrome(&state, &viewer),
                username: form.username,
                min_password_len: state.options.min_password_len,
                error: msg,
            })?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_form(State(state): State<AppState>, viewer: Viewer) -> Result<Html<String>, ApiError> {
    render(&LoginTemplate {
        chrome: chrome(&state, &viewer),
        username: String::new(),
        error: String::new(),
    })
}

/// Verifies credentials and hands out a session cookie.
pub async fn login(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let result = service::authenticate(
        state.store.as_ref(),
        state.auth.as_ref(),
        &form.username,
        &form.password,
    )
    .await;

    match result {
        Ok(user) => {
            let token = state.auth.issue_session(&user).map_err(AppError::from)?;
            info!(user_id = %user.id, "user logged in");
            let cookie = session_cookie(&token, state.options.session_max_age_secs);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Err(AppError::Unauthorized(msg)) => {
            let html = render(&LoginTemplate {
                chrome: chrome(&state, &viewer),
                username: form.username,
                error: msg,
            })?;
            Ok((StatusCode::UNAUTHORIZED, html).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout() -> Response {
    ([(header::SET_COOKIE, cleared_session_cookie())], Redirect::to("/")).into_response()
}

/// Fallback for unknown paths.
pub async fn not_found(State(state): State<AppState>, viewer: Viewer) -> Result<Response, ApiError> {
    not_found_page(&state, &viewer)
}

fn not_found_page(state: &AppState, viewer: &Viewer) -> Result<Response, ApiError> {
    let html = render(&NotFoundTemplate {
        chrome: chrome(state, viewer),
    })?;
    Ok((StatusCode::NOT_FOUND, html).into_response())
}

fn chrome(state: &AppState, viewer: &Viewer) -> Chrome {
    Chrome {
        site_name: state.options.site_name.clone(),
        viewer: viewer.username(),
    }
}

fn render<T: Template>(template: &T) -> Result<Html<String>, ApiError> {
    Ok(Html(template.render()?))
}
