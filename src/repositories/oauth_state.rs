//! # OAuth State Repository
//!
//! Database operations for the OAuth handshake lifecycle: create a single-use
//! state token, consume it exactly once, and garbage-collect expired rows.
//!
//! Expired rows are removed lazily; every create and consume call runs
//! [`OAuthStateRepository::cleanup_expired`] first.

use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use rand::RngCore;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::models::Platform;
use crate::models::oauth_state::{self, ActiveModel, Entity, HandshakePayload, Model};

/// Default handshake lifetime
pub const DEFAULT_STATE_TTL_MINUTES: i64 = 30;

/// Random bytes per state key; base64url encodes 48 bytes as 64 characters
const STATE_KEY_BYTES: usize = 48;

const MAX_KEY_ATTEMPTS: usize = 3;

/// Generate a cryptographically secure, URL-safe state token
pub fn generate_state_key() -> String {
    let mut bytes = [0u8; STATE_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_url::encode(&bytes)
}

/// Repository for OAuth handshake state
#[derive(Debug, Clone)]
pub struct OAuthStateRepository {
    db: Arc<DatabaseConnection>,
    ttl: Duration,
}

impl OAuthStateRepository {
    /// Create a repository using the default 30 minute TTL
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            ttl: Duration::minutes(DEFAULT_STATE_TTL_MINUTES),
        }
    }

    /// Override the handshake lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Persist a new handshake for `user_id` and return it.
    ///
    /// The returned model carries the generated `state_key`.
    pub async fn create_state(
        &self,
        user_id: i64,
        platform: Platform,
        auth_token: Option<String>,
    ) -> Result<Model, DbErr> {
        self.cleanup_expired().await?;

        let state_key = self.allocate_state_key().await?;
        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4(),
            state_key,
            user_id,
            platform,
            auth_token,
            expires_at: now + self.ttl,
            created_at: now,
        };

        let active = ActiveModel {
            id: Set(model.id),
            state_key: Set(model.state_key.clone()),
            user_id: Set(model.user_id),
            platform: Set(model.platform),
            auth_token: Set(model.auth_token.clone()),
            expires_at: Set(model.expires_at),
            created_at: Set(model.created_at),
        };

        // SQLite cannot hand back a UUID primary key, so skip RETURNING
        Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;

        counter!("oauth_states_created_total", "platform" => platform.as_str()).increment(1);
        tracing::debug!(
            user_id,
            platform = %platform,
            state_id = %model.id,
            expires_at = %model.expires_at,
            "OAuth handshake created"
        );

        Ok(model)
    }

    /// Consume a handshake, returning its payload at most once.
    ///
    /// Returns `Ok(None)` when the key is unknown, expired, or was consumed by
    /// a concurrent caller.
    pub async fn consume_state(&self, state_key: &str) -> Result<Option<HandshakePayload>, DbErr> {
        self.cleanup_expired().await?;

        let now = Utc::now();
        let Some(found) = Entity::find()
            .filter(oauth_state::Column::StateKey.eq(state_key))
            .filter(oauth_state::Column::ExpiresAt.gt(now))
            .one(&*self.db)
            .await?
        else {
            counter!("oauth_states_consume_miss_total").increment(1);
            return Ok(None);
        };

        // Only the caller whose delete removes the row owns the payload
        let deleted = Entity::delete_many()
            .filter(oauth_state::Column::Id.eq(found.id))
            .filter(oauth_state::Column::ExpiresAt.gt(now))
            .exec(&*self.db)
            .await?;

        if deleted.rows_affected != 1 {
            tracing::warn!(
                state_id = %found.id,
                "OAuth handshake consumed concurrently"
            );
            counter!("oauth_states_consume_miss_total").increment(1);
            return Ok(None);
        }

        counter!("oauth_states_consumed_total", "platform" => found.platform.as_str())
            .increment(1);

        Ok(Some(found.into()))
    }

    /// Delete every handshake whose expiry has passed
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = Entity::delete_many()
            .filter(oauth_state::Column::ExpiresAt.lt(Utc::now()))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::debug!(
                deleted = result.rows_affected,
                "Removed expired OAuth handshakes"
            );
        }

        Ok(result.rows_affected)
    }

    /// Find a handshake by key without consuming it (expired rows included)
    pub async fn find_by_state_key(&self, state_key: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(oauth_state::Column::StateKey.eq(state_key))
            .one(&*self.db)
            .await
    }

    async fn allocate_state_key(&self) -> Result<String, DbErr> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = generate_state_key();
            let taken = Entity::find()
                .filter(oauth_state::Column::StateKey.eq(candidate.as_str()))
                .count(&*self.db)
                .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            tracing::warn!("OAuth state key collision, regenerating");
        }

        Err(DbErr::Custom(
            "failed to allocate a unique OAuth state key".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn state_keys_are_long_and_url_safe() {
        let key = generate_state_key();
        assert_eq!(key.len(), 64);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn state_keys_do_not_repeat() {
        let keys: HashSet<String> = (0..256).map(|_| generate_state_key()).collect();
        assert_eq!(keys.len(), 256);
    }
}
