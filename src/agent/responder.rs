//! Remote responder client
//!
//! The responder is an HTTP service that takes the user's message plus the
//! full conversation history and returns a reply string.
//!
//! - `POST {base}/chat` with `{ "message": .., "history": [..] }`, answered by
//!   `{ "response": .. }` on 2xx
//! - `GET {base}/` as a connectivity probe

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::RemoteError;
use crate::types::HistoryEntry;

/// Default responder address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Produces assistant replies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    /// Reply to `message` given the full history (which already ends with it)
    async fn reply(&self, message: &str, history: &[HistoryEntry]) -> Result<String, RemoteError>;

    /// Check that the responder is reachable
    async fn probe(&self) -> Result<(), RemoteError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [HistoryEntry],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Responder reached over HTTP
#[derive(Clone)]
pub struct HttpResponder {
    client: Arc<Client>,
    base_url: String,
}

impl HttpResponder {
    /// Create a client for `base_url` with a transport timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the responder configuration
    pub fn from_config(config: &crate::config::ResponderConfig) -> Result<Self, RemoteError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn reply(&self, message: &str, history: &[HistoryEntry]) -> Result<String, RemoteError> {
        let url = format!("{}/chat", self.base_url);
        debug!("POST {} ({} history entries)", url, history.len());

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message, history })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Responder returned {}", status);
            return Err(RemoteError::BadStatus(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;

        info!("Received reply ({} chars)", body.response.chars().count());
        Ok(body.response)
    }

    async fn probe(&self) -> Result<(), RemoteError> {
        let url = format!("{}/", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::BadStatus(response.status().as_u16()))
        }
    }
}

impl std::fmt::Debug for HttpResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponder")
            .field("base_url", &self.base_url)
            .finish()
    }
}
