//! Social account entity model
//!
//! This module contains the SeaORM entity model for the social_accounts table,
//! which stores user-owned links to external social platforms.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use super::platform::Platform;

/// Social account entity representing a user's connected platform account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "social_accounts")]
pub struct Model {
    /// Unique identifier for the account (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user
    pub user_id: i64,

    /// Platform the account lives on
    pub platform: Platform,

    /// Platform-side account identifier (unique per user & platform)
    pub account_id: String,

    /// Display name reported by the platform
    pub account_name: Option<String>,

    /// Encrypted platform access token
    pub access_token_ciphertext: Option<Vec<u8>>,

    /// Expiry of the platform access token, if known
    pub token_expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
