// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bim_dash_client::ClientError;
use bim_dash_core::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Backend error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Offending fields of a rejected draft.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let fields = match &self {
            ApiError::Validation(errors) => errors.fields(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            fields,
        };

        (status, Json(body)).into_response()
    }
}

impl From<bim_dash_core::Error> for ApiError {
    fn from(err: bim_dash_core::Error) -> Self {
        use bim_dash_core::Error;
        match err {
            Error::LevelOutOfRange { .. } | Error::ParentNotSelected { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            Error::StoreIo { .. } | Error::StoreFormat { .. } => ApiError::Store(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(errors) => ApiError::Validation(errors),
            ClientError::Core(core) => core.into(),
            ClientError::InvalidSelection { .. } | ClientError::NoProject => {
                ApiError::BadRequest(err.to_string())
            }
            ClientError::Status { status: 404, .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}
