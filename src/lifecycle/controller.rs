//! Post lifecycle controller
//!
//! Applies [`transition`](super::transition) to stored posts. Each operation
//! loads the post scoped to its owner, validates the requested transition
//! against the observed status, and writes conditionally on that status so
//! concurrent writers cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use super::{LifecycleError, PostTransition, transition};
use crate::crypto::{CryptoError, CryptoKey};
use crate::cursor::CursorData;
use crate::models::post::Model as PostModel;
use crate::models::social_account::Model as SocialAccountModel;
use crate::publisher::{PlatformPublisher, PublishRequest};
use crate::repositories::{
    NewPost, PostListFilter, PostRepository, PublishedFields, SocialAccountRepository,
};

const MAX_CONTENT_CHARS: usize = 63_206;
const MAX_MEDIA_URLS: usize = 10;
const MAX_REASON_CHARS: usize = 500;

/// Errors returned by post lifecycle operations
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post {0} not found")]
    NotFound(Uuid),
    #[error("social account {0} not found")]
    SocialAccountNotFound(Uuid),
    #[error(transparent)]
    InvalidTransition(#[from] LifecycleError),
    #[error("post {0} was modified concurrently")]
    ConcurrentModification(Uuid),
    #[error("publish failed: {message}")]
    PublishFailed { message: String },
    #[error("no platform publisher is configured")]
    PublisherUnavailable,
    #[error("{0}")]
    Validation(String),
    #[error("access token unavailable: {0}")]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Drives posts through their lifecycle for an explicit owner
#[derive(Clone)]
pub struct PostLifecycleController {
    posts: PostRepository,
    accounts: SocialAccountRepository,
    publisher: Option<Arc<dyn PlatformPublisher>>,
}

impl PostLifecycleController {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self {
            posts: PostRepository::new(Arc::clone(&db)),
            accounts: SocialAccountRepository::new(db, crypto_key),
            publisher: None,
        }
    }

    /// Attach the platform client used by [`publish`](Self::publish)
    pub fn with_publisher(mut self, publisher: Option<Arc<dyn PlatformPublisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Create a draft post on one of the user's social accounts
    pub async fn create(&self, user_id: i64, input: NewPost) -> Result<PostModel, PostError> {
        validate_new_post(&input)?;

        self.accounts
            .find_owned(user_id, input.social_account_id)
            .await?
            .ok_or(PostError::SocialAccountNotFound(input.social_account_id))?;

        let post = self.posts.create(input).await?;

        counter!("posts_created_total").increment(1);
        info!(
            user_id,
            post_id = %post.id,
            social_account_id = %post.social_account_id,
            "Post created"
        );

        Ok(post)
    }

    pub async fn get(&self, user_id: i64, id: Uuid) -> Result<PostModel, PostError> {
        self.load_owned(user_id, id).await.map(|(post, _)| post)
    }

    pub async fn list(
        &self,
        user_id: i64,
        filter: &PostListFilter,
        cursor: Option<CursorData>,
        limit: u64,
    ) -> Result<(Vec<PostModel>, Option<String>), PostError> {
        Ok(self
            .posts
            .list_owned(user_id, filter, cursor, limit)
            .await?)
    }

    pub async fn approve(&self, user_id: i64, id: Uuid) -> Result<PostModel, PostError> {
        self.apply_status_change(user_id, id, PostTransition::Approve)
            .await
    }

    pub async fn reject(&self, user_id: i64, id: Uuid) -> Result<PostModel, PostError> {
        self.apply_status_change(user_id, id, PostTransition::Reject)
            .await
    }

    /// Set or clear `scheduled_at`. Past times are accepted.
    pub async fn schedule(
        &self,
        user_id: i64,
        id: Uuid,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<PostModel, PostError> {
        let (post, _) = self.load_owned(user_id, id).await?;
        transition(post.status, PostTransition::Schedule)?;

        if !self
            .posts
            .update_schedule(id, post.status, scheduled_at)
            .await?
        {
            return Err(PostError::ConcurrentModification(id));
        }

        self.record_transition(user_id, id, PostTransition::Schedule);
        self.reload(id).await
    }

    /// Publish through the configured platform client.
    ///
    /// The post is claimed before the platform is called, so a concurrent
    /// attempt fails with [`PostError::ConcurrentModification`] without
    /// reaching the platform. On failure the post keeps its status,
    /// `last_error`/`error_at` are recorded, and [`PostError::PublishFailed`] is
    /// returned so the caller may retry.
    pub async fn publish(
        &self,
        user_id: i64,
        id: Uuid,
        immediate: bool,
    ) -> Result<PostModel, PostError> {
        let requested = PostTransition::Publish { immediate };
        let (post, account) = self.load_owned(user_id, id).await?;
        transition(post.status, requested)?;

        let publisher = self
            .publisher
            .as_ref()
            .ok_or(PostError::PublisherUnavailable)?;

        let request = self.publish_request(&post, &account)?;

        let claim = self
            .posts
            .claim_publish(id, post.status)
            .await?
            .ok_or(PostError::ConcurrentModification(id))?;

        match publisher.publish(&request).await {
            Ok(platform_post_id) => {
                let fields = PublishedFields {
                    published_at: Utc::now(),
                    platform_post_id: Some(platform_post_id),
                    published_reason: None,
                };
                if !self.posts.complete_publish(id, claim, fields).await? {
                    warn!(
                        post_id = %id,
                        "Publish claim lost before completion; platform post may be orphaned"
                    );
                    return Err(PostError::ConcurrentModification(id));
                }

                self.record_transition(user_id, id, requested);
                self.reload(id).await
            }
            Err(err) => {
                let message = err.to_string();
                counter!(
                    "post_publish_failures_total",
                    "platform" => account.platform.as_str()
                )
                .increment(1);
                warn!(
                    user_id,
                    post_id = %id,
                    platform = %account.platform,
                    error = %message,
                    "Post publish failed"
                );

                if !self
                    .posts
                    .record_publish_failure(id, claim, &message, Utc::now())
                    .await?
                {
                    warn!(post_id = %id, "Publish claim lost before failure was recorded");
                    return Err(PostError::ConcurrentModification(id));
                }

                Err(PostError::PublishFailed { message })
            }
        }
    }

    /// Administrative override recording a publication that happened elsewhere
    pub async fn mark_published(
        &self,
        user_id: i64,
        id: Uuid,
        reason: &str,
        platform_post_id: Option<String>,
    ) -> Result<PostModel, PostError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PostError::Validation(
                "reason is required to mark a post as published".to_string(),
            ));
        }
        if reason.chars().count() > MAX_REASON_CHARS {
            return Err(PostError::Validation(format!(
                "reason must be at most {} characters",
                MAX_REASON_CHARS
            )));
        }
        let platform_post_id = platform_post_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let (post, _) = self.load_owned(user_id, id).await?;
        transition(post.status, PostTransition::MarkPublished)?;

        let fields = PublishedFields {
            published_at: Utc::now(),
            platform_post_id,
            published_reason: Some(reason.to_string()),
        };
        if !self.posts.mark_published(id, post.status, fields).await? {
            return Err(PostError::ConcurrentModification(id));
        }

        info!(user_id, post_id = %id, reason, "Post marked as published");
        self.record_transition(user_id, id, PostTransition::MarkPublished);
        self.reload(id).await
    }

    /// Delete a post in any status; published posts are not retracted
    pub async fn delete(&self, user_id: i64, id: Uuid) -> Result<(), PostError> {
        self.load_owned(user_id, id).await?;

        if !self.posts.delete(id).await? {
            return Err(PostError::NotFound(id));
        }

        counter!("posts_deleted_total").increment(1);
        info!(user_id, post_id = %id, "Post deleted");
        Ok(())
    }

    async fn apply_status_change(
        &self,
        user_id: i64,
        id: Uuid,
        requested: PostTransition,
    ) -> Result<PostModel, PostError> {
        let (post, _) = self.load_owned(user_id, id).await?;
        let next = transition(post.status, requested)?;

        if !self.posts.update_status(id, post.status, next).await? {
            return Err(PostError::ConcurrentModification(id));
        }

        self.record_transition(user_id, id, requested);
        self.reload(id).await
    }

    async fn load_owned(
        &self,
        user_id: i64,
        id: Uuid,
    ) -> Result<(PostModel, SocialAccountModel), PostError> {
        self.posts
            .find_owned(user_id, id)
            .await?
            .ok_or(PostError::NotFound(id))
    }

    async fn reload(&self, id: Uuid) -> Result<PostModel, PostError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(PostError::NotFound(id))
    }

    fn publish_request(
        &self,
        post: &PostModel,
        account: &SocialAccountModel,
    ) -> Result<PublishRequest, PostError> {
        Ok(PublishRequest {
            post_id: post.id,
            platform: account.platform,
            account_id: account.account_id.clone(),
            access_token: self.accounts.access_token(account)?,
            content: post.content.clone(),
            media_urls: post.media_url_list(),
            scheduled_at: post.scheduled_at,
        })
    }

    fn record_transition(&self, user_id: i64, id: Uuid, requested: PostTransition) {
        counter!("post_transitions_total", "transition" => requested.name()).increment(1);
        info!(user_id, post_id = %id, transition = %requested, "Post transition applied");
    }
}

fn validate_new_post(input: &NewPost) -> Result<(), PostError> {
    if input.content.trim().is_empty() {
        return Err(PostError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    if input.content.chars().count() > MAX_CONTENT_CHARS {
        return Err(PostError::Validation(format!(
            "content must be at most {} characters",
            MAX_CONTENT_CHARS
        )));
    }
    if input.media_urls.len() > MAX_MEDIA_URLS {
        return Err(PostError::Validation(format!(
            "at most {} media URLs are allowed",
            MAX_MEDIA_URLS
        )));
    }
    for raw in &input.media_urls {
        let valid = Url::parse(raw)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(PostError::Validation(format!(
                "media URL '{}' must be an absolute http(s) URL",
                raw
            )));
        }
    }
    Ok(())
}
