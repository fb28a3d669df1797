//! Post entity model
//!
//! This module contains the SeaORM entity model for the posts table. A post is
//! a unit of schedulable content owned by a social account, moving through the
//! draft / approved / published / rejected lifecycle.

use std::fmt;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a post
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Approved => "approved",
            PostStatus::Published => "published",
            PostStatus::Rejected => "rejected",
        }
    }

    /// Terminal states accept no further lifecycle transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostStatus::Published | PostStatus::Rejected)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    /// Unique identifier for the post (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning social account
    pub social_account_id: Uuid,

    /// Post body text
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Ordered list of media URLs (JSON array of strings)
    #[sea_orm(column_type = "Json")]
    pub media_urls: JsonValue,

    /// Whether the content came from the AI generator
    pub is_ai_generated: bool,

    /// Current lifecycle status
    pub status: PostStatus,

    /// Requested publish time; not validated against the current time
    pub scheduled_at: Option<DateTimeUtc>,

    /// Set only when the post reaches `published`
    pub published_at: Option<DateTimeUtc>,

    /// External identifier returned by the platform on publication
    pub platform_post_id: Option<String>,

    /// Audit note recorded by an administrative mark-as-published
    pub published_reason: Option<String>,

    /// Message of the most recent failed publish attempt
    pub last_error: Option<String>,

    /// When the most recent publish attempt failed
    pub error_at: Option<DateTimeUtc>,

    /// Token of the publish attempt currently talking to the platform
    pub publish_claim_id: Option<Uuid>,

    /// When that attempt started; claims older than the lease are abandoned
    pub publish_claimed_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Media URLs as an owned list, skipping any non-string entries
    pub fn media_url_list(&self) -> Vec<String> {
        self.media_urls
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::social_account::Entity",
        from = "Column::SocialAccountId",
        to = "super::social_account::Column::Id",
        on_delete = "Cascade"
    )]
    SocialAccount,
    #[sea_orm(has_one = "super::engagement_metric::Entity")]
    EngagementMetric,
}

impl Related<super::social_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialAccount.def()
    }
}

impl Related<super::engagement_metric::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EngagementMetric.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
