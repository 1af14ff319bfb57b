//! Remote name suggestions
//!
//! The service receives `{ "name", "violationReason" }` and answers with
//! `{ "suggestedName" }`. Only authentication and rate-limit failures are
//! surfaced; any other failure simply means "no suggestion".

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::AbortHandle;

use crate::config::SuggestionConfig;

/// Failures the user must act on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("Sign in to use name suggestions")]
    AuthenticationRequired,
    #[error("Name suggestion limit reached, try again later")]
    RateLimited,
    #[error("Failed to build suggestion client: {0}")]
    Client(String),
}

/// Source of replacement names for functions
#[tower_lsp::async_trait]
pub trait SuggestionService: Send + Sync {
    /// First suggested name, or `None` when nothing usable came back
    async fn suggest(&self, name: &str, reason: &str) -> Result<Option<String>, SuggestionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionRequest<'a> {
    name: &'a str,
    violation_reason: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionResponse {
    suggested_name: Option<String>,
}

/// Map an HTTP status and body to a suggestion
pub fn interpret_response(status: u16, body: &str) -> Result<Option<String>, SuggestionError> {
    match status {
        401 => Err(SuggestionError::AuthenticationRequired),
        429 => Err(SuggestionError::RateLimited),
        200..=299 => Ok(serde_json::from_str::<SuggestionResponse>(body)
            .ok()
            .and_then(|r| r.suggested_name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())),
        _ => {
            tracing::debug!("Suggestion service returned HTTP {}", status);
            Ok(None)
        }
    }
}

/// Suggestion service over HTTP.
///
/// A new request for a name aborts the one still in flight for that name.
pub struct HttpSuggestionClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    in_flight: DashMap<String, (u64, AbortHandle)>,
    next_request: AtomicU64,
}

impl HttpSuggestionClient {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SuggestionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("name-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e: reqwest::Error| SuggestionError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            in_flight: DashMap::new(),
            next_request: AtomicU64::new(0),
        })
    }

    /// Client for the configured endpoint, if any
    pub fn from_config(config: &SuggestionConfig) -> Option<Result<Self, SuggestionError>> {
        let endpoint = config.endpoint.as_deref()?;
        Some(Self::new(
            endpoint,
            config.session_token.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

#[tower_lsp::async_trait]
impl SuggestionService for HttpSuggestionClient {
    async fn suggest(&self, name: &str, reason: &str) -> Result<Option<String>, SuggestionError> {
        let mut request = self.client.post(&self.endpoint).json(&SuggestionRequest {
            name,
            violation_reason: reason,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let task = tokio::spawn(async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        });

        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self
            .in_flight
            .insert(name.to_string(), (id, task.abort_handle()))
        {
            previous.abort();
        }

        let outcome = task.await;
        self.in_flight.remove_if(name, |_, (current, _)| *current == id);

        match outcome {
            Ok(Ok((status, body))) => interpret_response(status, &body),
            Ok(Err(e)) => {
                tracing::debug!("Suggestion request for '{}' failed: {}", name, e);
                Ok(None)
            }
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Suggestion request for '{}' superseded", name);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Suggestion task for '{}' failed: {}", name, e);
                Ok(None)
            }
        }
    }
}
