//! Post repository for database operations
//!
//! Owner-scoped reads go through a join on social_accounts so a user can only
//! see posts of accounts they own. Every status-changing write is conditional
//! on the status the caller observed; a `false` return means another writer
//! changed the row first.
//!
//! Publishing holds a claim on the row (`publish_claim_id`) for the duration of
//! the platform call. While a live claim exists every other conditional write
//! misses, so at most one attempt reaches the platform.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::cursor::{CursorData, encode_cursor};
use crate::models::engagement_metric::{self, Entity as EngagementMetric};
use crate::models::post::{self, ActiveModel, Entity as Post, Model, PostStatus};
use crate::models::social_account::{self, Model as SocialAccountModel};

/// Input for a new draft post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub social_account_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub is_ai_generated: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Optional filters for listing posts
#[derive(Debug, Clone, Default)]
pub struct PostListFilter {
    pub status: Option<PostStatus>,
    pub social_account_id: Option<Uuid>,
}

/// Outcome of a successful publish
#[derive(Debug, Clone)]
pub struct PublishedFields {
    pub published_at: DateTime<Utc>,
    pub platform_post_id: Option<String>,
    pub published_reason: Option<String>,
}

/// Claims older than this are treated as abandoned by a crashed attempt
pub const DEFAULT_PUBLISH_CLAIM_LEASE_MINUTES: i64 = 10;

/// Repository for post database operations
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
    claim_lease: Duration,
}

impl PostRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            claim_lease: Duration::minutes(DEFAULT_PUBLISH_CLAIM_LEASE_MINUTES),
        }
    }

    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    /// Rows with no publish claim, or one whose lease has run out
    fn unclaimed(&self, now: DateTime<Utc>) -> Condition {
        Condition::any()
            .add(post::Column::PublishClaimId.is_null())
            .add(post::Column::PublishClaimedAt.lt(now - self.claim_lease))
    }

    /// Insert a new post in `draft`
    pub async fn create(&self, input: NewPost) -> Result<Model, DbErr> {
        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4(),
            social_account_id: input.social_account_id,
            content: input.content,
            media_urls: JsonValue::from(input.media_urls),
            is_ai_generated: input.is_ai_generated,
            status: PostStatus::Draft,
            scheduled_at: input.scheduled_at,
            published_at: None,
            platform_post_id: None,
            published_reason: None,
            last_error: None,
            error_at: None,
            publish_claim_id: None,
            publish_claimed_at: None,
            created_at: now,
            updated_at: now,
        };

        let active = ActiveModel {
            id: Set(model.id),
            social_account_id: Set(model.social_account_id),
            content: Set(model.content.clone()),
            media_urls: Set(model.media_urls.clone()),
            is_ai_generated: Set(model.is_ai_generated),
            status: Set(model.status),
            scheduled_at: Set(model.scheduled_at),
            published_at: Set(None),
            platform_post_id: Set(None),
            published_reason: Set(None),
            last_error: Set(None),
            error_at: Set(None),
            publish_claim_id: Set(None),
            publish_claimed_at: Set(None),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        };

        Post::insert(active).exec_without_returning(&*self.db).await?;
        Ok(model)
    }

    /// Fetch a post by id without owner scoping
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, DbErr> {
        Post::find_by_id(id).one(&*self.db).await
    }

    /// Fetch a post and its social account, only if the account belongs to `user_id`
    pub async fn find_owned(
        &self,
        user_id: i64,
        id: Uuid,
    ) -> Result<Option<(Model, SocialAccountModel)>, DbErr> {
        let found = Post::find_by_id(id)
            .find_also_related(social_account::Entity)
            .filter(social_account::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;

        Ok(found.and_then(|(post, account)| account.map(|account| (post, account))))
    }

    /// List a user's posts in `(created_at, id)` order.
    ///
    /// Returns the page and the cursor of its last row when more rows follow.
    pub async fn list_owned(
        &self,
        user_id: i64,
        filter: &PostListFilter,
        cursor: Option<CursorData>,
        limit: u64,
    ) -> Result<(Vec<Model>, Option<String>), DbErr> {
        let mut query = Post::find()
            .join(JoinType::InnerJoin, post::Relation::SocialAccount.def())
            .filter(social_account::Column::UserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(post::Column::Status.eq(status));
        }
        if let Some(account_id) = filter.social_account_id {
            query = query.filter(post::Column::SocialAccountId.eq(account_id));
        }
        if let Some(cursor) = cursor {
            query = query.filter(
                Condition::any()
                    .add(post::Column::CreatedAt.gt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(post::Column::CreatedAt.eq(cursor.created_at))
                            .add(post::Column::Id.gt(cursor.id)),
                    ),
            );
        }

        let mut posts = query
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .limit(limit + 1)
            .all(&*self.db)
            .await?;

        let has_more = posts.len() as u64 > limit;
        if has_more {
            posts.truncate(limit as usize);
        }

        let next_cursor = if has_more {
            posts
                .last()
                .map(|last| encode_cursor(&last.created_at, &last.id))
        } else {
            None
        };

        Ok((posts, next_cursor))
    }

    /// Move a post from `observed` to `next` without touching other fields
    pub async fn update_status(
        &self,
        id: Uuid,
        observed: PostStatus,
        next: PostStatus,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = Post::update_many()
            .set(ActiveModel {
                status: Set(next),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(observed))
            .filter(self.unclaimed(now))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Set `scheduled_at` while the post is still in `observed`
    pub async fn update_schedule(
        &self,
        id: Uuid,
        observed: PostStatus,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = Post::update_many()
            .set(ActiveModel {
                scheduled_at: Set(scheduled_at),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(observed))
            .filter(self.unclaimed(now))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Transition to `published` without a platform call, clearing any
    /// recorded publish failure
    pub async fn mark_published(
        &self,
        id: Uuid,
        observed: PostStatus,
        fields: PublishedFields,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = Post::update_many()
            .set(published_changes(fields, now))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(observed))
            .filter(self.unclaimed(now))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Take the publish claim on a post still in `observed`.
    ///
    /// Returns the claim token, or `None` when the status moved or another
    /// attempt holds a live claim.
    pub async fn claim_publish(
        &self,
        id: Uuid,
        observed: PostStatus,
    ) -> Result<Option<Uuid>, DbErr> {
        let now = Utc::now();
        let claim = Uuid::new_v4();
        let result = Post::update_many()
            .set(ActiveModel {
                publish_claim_id: Set(Some(claim)),
                publish_claimed_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(observed))
            .filter(self.unclaimed(now))
            .exec(&*self.db)
            .await?;

        Ok((result.rows_affected == 1).then_some(claim))
    }

    /// Record a successful publish and release `claim`
    pub async fn complete_publish(
        &self,
        id: Uuid,
        claim: Uuid,
        fields: PublishedFields,
    ) -> Result<bool, DbErr> {
        let result = Post::update_many()
            .set(published_changes(fields, Utc::now()))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::PublishClaimId.eq(claim))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Record a failed publish attempt and release `claim`; status is left
    /// unchanged
    pub async fn record_publish_failure(
        &self,
        id: Uuid,
        claim: Uuid,
        message: &str,
        failed_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = Post::update_many()
            .set(ActiveModel {
                last_error: Set(Some(message.to_string())),
                error_at: Set(Some(failed_at)),
                publish_claim_id: Set(None),
                publish_claimed_at: Set(None),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::PublishClaimId.eq(claim))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Delete a post and its metrics snapshot
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        EngagementMetric::delete_many()
            .filter(engagement_metric::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = Post::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(deleted.rows_affected == 1)
    }
}

fn published_changes(fields: PublishedFields, now: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        status: Set(PostStatus::Published),
        published_at: Set(Some(fields.published_at)),
        platform_post_id: Set(fields.platform_post_id),
        published_reason: Set(fields.published_reason),
        last_error: Set(None),
        error_at: Set(None),
        publish_claim_id: Set(None),
        publish_claimed_at: Set(None),
        updated_at: Set(now),
        ..Default::default()
    }
}
