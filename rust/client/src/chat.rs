// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assistant chat transcript.

use serde::Serialize;

use crate::backend::Backend;
use crate::error::Result;

/// Bot line shown when the backend cannot answer.
pub const CHAT_ERROR_REPLY: &str = "Server error. Check the connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Ordered conversation with at most one question in flight.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Records a user question and marks the transcript pending.
    ///
    /// Returns the trimmed question to send, or `None` when it is blank or a
    /// previous question is still unanswered.
    pub fn begin(&mut self, question: &str) -> Option<String> {
        let question = question.trim();
        if question.is_empty() || self.pending {
            return None;
        }
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: question.to_string(),
        });
        self.pending = true;
        Some(question.to_string())
    }

    /// Appends the reply, or the error line if the request failed.
    pub fn finish(&mut self, reply: Result<String>) {
        let text = match reply {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                CHAT_ERROR_REPLY.to_string()
            }
        };
        self.messages.push(ChatMessage {
            role: ChatRole::Bot,
            text,
        });
        self.pending = false;
    }

    /// Asks `backend` and records both sides. Returns whether a question was
    /// sent.
    pub async fn send(&mut self, backend: &dyn Backend, question: &str) -> bool {
        let Some(question) = self.begin(question) else {
            return false;
        };
        let reply = backend.ask(&question).await.map(|reply| reply.answer);
        self.finish(reply);
        true
    }
}
