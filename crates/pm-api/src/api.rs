//! JSON endpoints used by the page scripts.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use pm_core::models::{Comment, CommentDraft, ItemKind, VoteDirection};
use pm_core::service;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub votes: u32,
}

/// POST /api/vote
pub async fn vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(req) = payload?;
    let votes = service::cast_vote(state.store.as_ref(), req.kind, &req.id, req.direction).await?;
    Ok(Json(VoteResponse {
        success: true,
        votes,
    }))
}

/// Every field is optional on the wire so that `null` or a missing key is a
/// validation error (400) rather than a body-parsing rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub story_id: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
    pub parent_id: Option<String>,
}

impl From<CommentRequest> for CommentDraft {
    fn from(req: CommentRequest) -> Self {
        CommentDraft {
            story_id: req.story_id.unwrap_or_default(),
            author: req.author.unwrap_or_default(),
            text: req.text.unwrap_or_default(),
            parent_id: req.parent_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: Comment,
}

/// POST /api/comment
pub async fn comment(
    State(state): State<AppState>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<CommentResponse>, ApiError> {
    let Json(req) = payload?;
    let comment = service::add_comment(state.store.as_ref(), req.into()).await?;
    Ok(Json(CommentResponse {
        success: true,
        comment,
    }))
}
