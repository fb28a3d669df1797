//! Engagement metric entity model
//!
//! Latest collected engagement snapshot for a post. One row per post; a new
//! snapshot replaces the previous one.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "engagement_metrics")]
pub struct Model {
    /// Post this snapshot belongs to (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub impressions: i64,
    pub reach: i64,
    /// When the snapshot was collected
    pub collected_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
