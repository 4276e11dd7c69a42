//! # HTTP Retrieval Utilities
//!
//! An asynchronous API client wrapper around `reqwest`, with retry middleware
//! and a uniform `ApiResponse` for both success and failure statuses.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

/// The outcome of a request that reached the server.
///
/// Non-2xx statuses are not errors at this level; `success` tells them apart.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized body of a successful response.
    pub data: Option<T>,
    /// The raw body of a failed response, kept for logging.
    pub error_body: Option<String>,
    pub status: u16,
    /// True for 2xx statuses.
    pub success: bool,
    pub headers: HeaderMap,
}

/// How requests authenticate.
#[derive(Clone)]
pub enum ApiAuth {
    /// A key carried in a named header, e.g. `x-goog-api-key`.
    Header { name: HeaderName, value: String },
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuth::Header { name, .. } => write!(f, "Header({name}: ***)"),
        }
    }
}

pub struct ApiClient {
    inner: ClientWithMiddleware,
    /// Every request path is joined onto this.
    base_url: Url,
    auth: Option<ApiAuth>,
}

impl ApiClient {
    /// Creates a client that retries transient failures up to three times.
    ///
    /// `base_url` must be absolute. Keep the trailing slash if relative paths
    /// should extend it rather than replace its last segment.
    pub fn new(base_url: &str, auth: Option<ApiAuth>, timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(base_url)?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: client,
            base_url: url,
            auth,
        })
    }

    /// Sends `body` as JSON to `path` and decodes a JSON reply into `T`.
    ///
    /// # Errors
    /// URL joining, transport failures, and undecodable 2xx bodies.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<&B>,
    ) -> anyhow::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let full_url = self.base_url.join(path)?;
        let mut req = self.inner.request(method, full_url);

        if let Some(h) = headers {
            req = req.headers(h);
        }

        match &self.auth {
            Some(ApiAuth::Header { name, value }) => {
                req = req.header(name.clone(), HeaderValue::from_str(value)?);
            }
            None => {}
        }

        if let Some(b) = body {
            let json_body = serde_json::to_string(b)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let data = response.json::<T>().await?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }
}
