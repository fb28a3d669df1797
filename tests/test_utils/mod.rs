//! Test utilities for database testing.
//!
//! In-memory SQLite with every migration applied, plus fixture helpers.

use std::sync::Arc;

use anyhow::Result;
use postpilot::crypto::CryptoKey;
use postpilot::migration::{Migrator, MigratorTrait};
use postpilot::models::Platform;
use postpilot::models::social_account::Model as SocialAccountModel;
use postpilot::repositories::{NewSocialAccount, SocialAccountRepository};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is capped at one connection; every SQLite memory connection is a
/// separate database.
pub async fn setup_test_db() -> Result<Arc<DatabaseConnection>> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(Arc::new(db))
}

#[allow(dead_code)]
pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![42u8; 32]).expect("32 byte key")
}

/// Links a social account for `user_id` with a stored access token.
#[allow(dead_code)]
pub async fn create_social_account(
    db: &Arc<DatabaseConnection>,
    user_id: i64,
    platform: Platform,
    account_id: &str,
) -> Result<SocialAccountModel> {
    let repo = SocialAccountRepository::new(Arc::clone(db), test_crypto_key());
    let account = repo
        .create(
            user_id,
            NewSocialAccount {
                platform,
                account_id: account_id.to_string(),
                account_name: Some("Test Account".to_string()),
                access_token: Some(format!("token-{}", account_id)),
                token_expires_at: None,
            },
        )
        .await?;
    Ok(account)
}
