// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client error types.

use bim_dash_core::ValidationErrors;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the backend or driving a page.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A base URL could not be parsed.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A selected value cannot be sent to the backend as-is.
    #[error("invalid {level} selection {value:?}")]
    InvalidSelection { level: String, value: String },

    /// A designer operation needs a selected project.
    #[error("no project selected")]
    NoProject,

    /// The draft failed validation and was not sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Core(#[from] bim_dash_core::Error),
}

impl ClientError {
    /// Short message suitable for an inline notice.
    pub fn notice(&self) -> String {
        match self {
            ClientError::Transport { .. } => "The backend could not be reached".to_string(),
            ClientError::Status { status, .. } => {
                format!("The backend answered with status {status}")
            }
            ClientError::Decode { .. } => "The backend sent an unexpected response".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status returned by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
