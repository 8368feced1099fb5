//! HTTP mapping for [`AppError`].

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pm_core::error::AppError;
use serde_json::json;
use tracing::error;

/// Wraps [`AppError`] so it can be returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show to a visitor. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match &self.0 {
            AppError::NotFound(kind, _) => format!("{kind} not found"),
            AppError::ValidationError(msg) | AppError::Unauthorized(msg) => msg.clone(),
            AppError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

/// Malformed JSON bodies become a 400 in the usual `{success: false}` shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::validation(rejection.body_text()))
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        ApiError(AppError::Internal(format!("template rendering failed: {err}")))
    }
}

/// JSON body `{success: false, error}` with the mapped status.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = Json(json!({ "success": false, "error": self.public_message() }));
        (status, body).into_response()
    }
}
