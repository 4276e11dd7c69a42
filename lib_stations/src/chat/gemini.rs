use std::time::Duration;

use reqwest::header::HeaderName;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::conversation::{ChatBackend, ChatError, ChatPart, ChatTurn};
use crate::retrieve::{ApiAuth, ApiClient};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ChatPart>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

/// `models/{model}:generateContent` over the retrying `ApiClient`.
pub struct GeminiClient {
    api: ApiClient,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let auth = ApiAuth::Header {
            name: HeaderName::from_static("x-goog-api-key"),
            value: api_key.to_string(),
        };
        Ok(Self {
            api: ApiClient::new(base_url, Some(auth), timeout)?,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatBackend for GeminiClient {
    async fn generate(&self, history: &[ChatTurn]) -> Result<Option<String>, ChatError> {
        let path = format!("models/{}:generateContent", self.model);
        let body = GenerateContentRequest { contents: history };

        let response = self
            .api
            .request::<GenerateContentResponse, _>(Method::POST, &path, None, Some(&body))
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.success {
            return Err(ChatError::Status {
                status: response.status,
                body: response.error_body.unwrap_or_default(),
            });
        }
        Ok(response.data.and_then(GenerateContentResponse::first_text))
    }
}
