use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::{
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader, PayloadTooLarge,
        UnsupportedMediaType,
    },
    reply::{Json, WithStatus},
    Rejection, Reply,
};

use crate::error::LoadError;
use crate::load::LoadSummary;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub rows_committed: usize,
    pub inserted_ids: Vec<i64>,
    pub processing_time_seconds: f64,
    pub summary: LoadSummary,
}

impl UploadResponse {
    pub fn from_summary(summary: LoadSummary, elapsed: f64) -> Self {
        Self {
            success: true,
            message: format!("loaded {} row(s)", summary.rows_committed),
            rows_committed: summary.rows_committed,
            inserted_ids: summary.inserted_ids.clone(),
            processing_time_seconds: elapsed,
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_committed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            rows_committed: None,
            row: None,
        }
    }
}

pub fn error(status: StatusCode, body: ErrorBody) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Map each load failure onto its own status code and error tag.
pub fn load_error(err: LoadError) -> WithStatus<Json> {
    let message = err.to_string();
    match err {
        LoadError::Decode(_) => error(
            StatusCode::BAD_REQUEST,
            ErrorBody::new("decoding_failed", message),
        ),
        LoadError::Csv { line, .. } => error(
            StatusCode::BAD_REQUEST,
            ErrorBody {
                row: line,
                ..ErrorBody::new("malformed_csv", message)
            },
        ),
        LoadError::Validation { errors, committed } => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody {
                details: Some(errors),
                rows_committed: Some(committed),
                ..ErrorBody::new("validation_failed", message)
            },
        ),
        LoadError::Persistence { row, .. } => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                row,
                ..ErrorBody::new("persistence_failed", message)
            },
        ),
    }
}

/// A blocking task that panicked or was cancelled, kept apart from store failures.
pub fn internal_error(err: tokio::task::JoinError) -> WithStatus<Json> {
    error!(error = %err, "blocking task did not complete");
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new("internal_error", err.to_string()),
    )
}

/// Turn warp's own rejections into JSON bodies.
pub async fn recover(rej: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if rej.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorBody::new("not_found", "no such route"),
        )
    } else if let Some(e) = rej.find::<InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("invalid_query", e.to_string()),
        )
    } else if let Some(e) = rej.find::<PayloadTooLarge>() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorBody::new("payload_too_large", e.to_string()),
        )
    } else if let Some(e) = rej.find::<LengthRequired>() {
        (
            StatusCode::LENGTH_REQUIRED,
            ErrorBody::new("invalid_upload", e.to_string()),
        )
    } else if let Some(e) = rej.find::<MissingHeader>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("invalid_upload", e.to_string()),
        )
    } else if let Some(e) = rej.find::<UnsupportedMediaType>() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorBody::new("invalid_upload", e.to_string()),
        )
    } else if let Some(e) = rej.find::<MethodNotAllowed>() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorBody::new("method_not_allowed", e.to_string()),
        )
    } else {
        warn!("unhandled rejection: {:?}", rej);
        (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("bad_request", format!("{:?}", rej)),
        )
    };
    Ok(error(status, body))
}
