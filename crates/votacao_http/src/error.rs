//! HTTP error mapping.
//!
//! # Invariants
//! - Rule violations keep their own status and message.
//! - Infrastructure failures are logged here and answered with a generic
//!   500 body; internal details never reach the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::{json, Map, Value};
use std::fmt::Display;
use thiserror::Error;
use votacao_core::db::DbError;
use votacao_core::{ValidationError, VotingError};

const UNEXPECTED_MESSAGE: &str = "unexpected error, please try again later";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database bootstrap failed: {0}")]
    Db(#[from] DbError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error(transparent)]
    Voting(#[from] VotingError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("request worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    /// Broken internal contract; logged, never shown to the client.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => error_body(status, message),
            ApiError::Voting(err) => voting_response(err),
            ApiError::Db(err) => unexpected("db_open_failed", &err),
            ApiError::Worker(err) => unexpected("worker_failed", &err),
            ApiError::Internal(detail) => unexpected("internal_contract", &detail),
        }
    }
}

fn voting_response(err: VotingError) -> Response {
    if err.is_unexpected() {
        return unexpected(err.code(), &err);
    }
    let status = match &err {
        VotingError::AgendaDuplicate(_) | VotingError::DuplicateVote { .. } => StatusCode::CONFLICT,
        VotingError::AgendaNotFound(_) => StatusCode::NOT_FOUND,
        VotingError::SessionAlreadyOpen(_)
        | VotingError::SessionNotOpened(_)
        | VotingError::SessionClosed(_) => StatusCode::BAD_REQUEST,
        VotingError::VoterNotAuthorized { .. } => StatusCode::UNAUTHORIZED,
        VotingError::Validation(validation) => return validation_response(validation),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, err.to_string())
}

fn validation_response(err: &ValidationError) -> Response {
    let mut fields = Map::new();
    fields.insert(err.field().to_string(), Value::String(err.to_string()));
    (StatusCode::BAD_REQUEST, Json(Value::Object(fields))).into_response()
}

fn unexpected(code: &str, err: &dyn Display) -> Response {
    error!("event=http_request module=http status=error error_code={code} error={err}");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_MESSAGE.to_string())
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
