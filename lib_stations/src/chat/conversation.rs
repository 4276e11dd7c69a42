use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown to the user whenever the backend fails.
pub const GENERIC_ERROR_REPLY: &str = "An error occurred. Please try again later.";
/// Shown when the backend answered without any text.
pub const NO_ANSWER_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again.";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChatError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("chat backend is not configured")]
    NotConfigured,

    #[error("chat API call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat API request failed: {0}")]
    Transport(String),
}

impl ChatError {
    /// What the end user gets to see instead of the technical error.
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::EmptyPrompt => NO_ANSWER_REPLY,
            ChatError::NotConfigured | ChatError::Status { .. } | ChatError::Transport(_) => {
                GENERIC_ERROR_REPLY
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

/// One message of the history, in the `contents[]` shape the API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ChatPart { text: text.into() }],
        }
    }
}

/// Something that turns a history into the next model message.
pub trait ChatBackend: Send + Sync {
    /// `Ok(None)` means the call succeeded but produced no text.
    fn generate(
        &self,
        history: &[ChatTurn],
    ) -> impl Future<Output = Result<Option<String>, ChatError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct ChatConversation {
    history: Vec<ChatTurn>,
}

impl ChatConversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Sends `prompt` with the full history and returns the text to show.
    ///
    /// The user turn is recorded before the call and stays recorded whatever
    /// happens. The model turn is only appended when the backend produced text.
    /// A missing backend behaves like a failed call.
    pub async fn ask<B: ChatBackend>(
        &mut self,
        backend: Option<&B>,
        prompt: &str,
    ) -> Result<String, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        self.history.push(ChatTurn::new(ChatRole::User, prompt));

        let backend = backend.ok_or(ChatError::NotConfigured)?;
        match backend.generate(&self.history).await? {
            Some(text) => {
                self.history.push(ChatTurn::new(ChatRole::Model, text.clone()));
                Ok(text)
            }
            None => Ok(NO_ANSWER_REPLY.to_string()),
        }
    }
}
