// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assistant endpoint.

use axum::{extract::State, Json};
use bim_dash_core::{ChatAnswer, ChatQuestion};

use crate::error::ApiError;
use crate::AppState;

/// POST /api/v1/chat
pub async fn ask(
    State(state): State<AppState>,
    Json(body): Json<ChatQuestion>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".into()));
    }
    Ok(Json(state.backend.ask(question).await?))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send_json, stub_app, StubBackend};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn forwards_trimmed_question() {
        let app = stub_app(StubBackend::sample());
        let (status, body) =
            send_json(&app, Method::POST, "/api/v1/chat", json!({"question": " Hi "})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "You asked: Hi");
    }

    #[tokio::test]
    async fn blank_question_is_bad_request() {
        let app = stub_app(StubBackend::sample());
        let (status, _) =
            send_json(&app, Method::POST, "/api/v1/chat", json!({"question": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
