//! Social account repository
//!
//! Owner-scoped access to the social_accounts table. Access tokens are
//! encrypted before they reach the database and every lookup is filtered by
//! the owning user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{CryptoError, CryptoKey, decrypt_access_token, encrypt_access_token};
use crate::models::engagement_metric::{self, Entity as EngagementMetric};
use crate::models::post::{self, Entity as Post};
use crate::models::social_account::{self, ActiveModel, Entity as SocialAccount, Model};
use crate::models::Platform;

/// Errors raised by social account persistence
#[derive(Debug, Error)]
pub enum SocialAccountError {
    #[error("token encryption failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Input for linking a new social account
#[derive(Debug, Clone)]
pub struct NewSocialAccount {
    pub platform: Platform,
    pub account_id: String,
    pub account_name: Option<String>,
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Repository for social account database operations
#[derive(Debug, Clone)]
pub struct SocialAccountRepository {
    db: Arc<DatabaseConnection>,
    crypto_key: CryptoKey,
}

impl SocialAccountRepository {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    /// Link a social account to `user_id`, encrypting its access token
    pub async fn create(
        &self,
        user_id: i64,
        input: NewSocialAccount,
    ) -> Result<Model, SocialAccountError> {
        let ciphertext = input
            .access_token
            .as_deref()
            .map(|token| {
                encrypt_access_token(
                    &self.crypto_key,
                    user_id,
                    input.platform,
                    &input.account_id,
                    token,
                )
            })
            .transpose()?;

        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4(),
            user_id,
            platform: input.platform,
            account_id: input.account_id,
            account_name: input.account_name,
            access_token_ciphertext: ciphertext,
            token_expires_at: input.token_expires_at,
            created_at: now,
            updated_at: now,
        };

        let active = ActiveModel {
            id: Set(model.id),
            user_id: Set(model.user_id),
            platform: Set(model.platform),
            account_id: Set(model.account_id.clone()),
            account_name: Set(model.account_name.clone()),
            access_token_ciphertext: Set(model.access_token_ciphertext.clone()),
            token_expires_at: Set(model.token_expires_at),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        };

        SocialAccount::insert(active)
            .exec_without_returning(&*self.db)
            .await?;

        tracing::info!(
            user_id,
            platform = %model.platform,
            social_account_id = %model.id,
            "Social account linked"
        );

        Ok(model)
    }

    /// Find an account by id, only if it belongs to `user_id`
    pub async fn find_owned(&self, user_id: i64, id: Uuid) -> Result<Option<Model>, DbErr> {
        SocialAccount::find_by_id(id)
            .filter(social_account::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
    }

    /// All accounts of a user ordered by creation time then id
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Model>, DbErr> {
        SocialAccount::find()
            .filter(social_account::Column::UserId.eq(user_id))
            .order_by_asc(social_account::Column::CreatedAt)
            .order_by_asc(social_account::Column::Id)
            .all(&*self.db)
            .await
    }

    /// Decrypt the stored access token of an account
    pub fn access_token(&self, account: &Model) -> Result<Option<String>, CryptoError> {
        decrypt_access_token(&self.crypto_key, account).inspect_err(|_| {
            tracing::error!(
                user_id = account.user_id,
                platform = %account.platform,
                social_account_id = %account.id,
                "Access token decryption failed"
            );
        })
    }

    /// Delete an owned account together with its posts and their metrics.
    ///
    /// Returns `false` when the account does not exist for `user_id`.
    pub async fn delete_owned(&self, user_id: i64, id: Uuid) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let Some(account) = SocialAccount::find_by_id(id)
            .filter(social_account::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(false);
        };

        let post_ids: Vec<Uuid> = Post::find()
            .select_only()
            .column(post::Column::Id)
            .filter(post::Column::SocialAccountId.eq(account.id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !post_ids.is_empty() {
            EngagementMetric::delete_many()
                .filter(engagement_metric::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
            Post::delete_many()
                .filter(post::Column::Id.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
        }

        SocialAccount::delete_by_id(account.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            user_id,
            social_account_id = %account.id,
            deleted_posts = post_ids.len(),
            "Social account deleted"
        );

        Ok(true)
    }
}
