//! Error types for the dashboard API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid recipe selection: {0}")]
    InvalidSelection(String),

    #[error("unknown recipe group: {0}")]
    InvalidGroup(String),

    #[error("group and selected cannot be combined")]
    ConflictingSelection,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidThreshold(_)
            | ApiError::InvalidPolicy(_)
            | ApiError::InvalidSelection(_)
            | ApiError::InvalidGroup(_)
            | ApiError::ConflictingSelection => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
