//! # Platform Publisher
//!
//! The seam between the post lifecycle and the outside world. The lifecycle
//! controller hands a [`PublishRequest`] to a [`PlatformPublisher`] and only
//! consumes the result: an external post id on success or a [`PublishError`].
//!
//! [`HttpPublisher`] forwards requests to a publish gateway service that owns
//! the per-platform delivery.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::models::Platform;

const BODY_SNIPPET_CHARS: usize = 200;

/// Everything a platform client needs to publish one post
#[derive(Clone, Serialize)]
pub struct PublishRequest {
    pub post_id: Uuid,
    pub platform: Platform,
    pub account_id: String,
    pub access_token: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("post_id", &self.post_id)
            .field("platform", &self.platform)
            .field("account_id", &self.account_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("content_len", &self.content.len())
            .field("media_urls", &self.media_urls)
            .field("scheduled_at", &self.scheduled_at)
            .finish()
    }
}

/// Failure reported by a platform client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("platform rejected the post (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("publish gateway unreachable: {0}")]
    Network(String),
    #[error("malformed publish gateway response: {0}")]
    MalformedResponse(String),
    #[error("publisher misconfigured: {0}")]
    Configuration(String),
}

/// Publishes post content to a social platform
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    /// Publish the post, returning the platform's identifier for it
    async fn publish(&self, request: &PublishRequest) -> Result<String, PublishError>;
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    platform_post_id: String,
}

/// Publisher that delegates delivery to an HTTP publish gateway
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPublisher {
    /// Create a publisher posting to `endpoint` with the given request timeout
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Configuration(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PlatformPublisher for HttpPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                post_id = %request.post_id,
                platform = %request.platform,
                status = status.as_u16(),
                "Publish gateway rejected post"
            );
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message: truncate_snippet(&body),
            });
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        if parsed.platform_post_id.trim().is_empty() {
            return Err(PublishError::MalformedResponse(
                "platform_post_id is empty".to_string(),
            ));
        }

        Ok(parsed.platform_post_id)
    }
}

fn truncate_snippet(body: &str) -> String {
    if body.chars().count() > BODY_SNIPPET_CHARS {
        let truncated: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}
