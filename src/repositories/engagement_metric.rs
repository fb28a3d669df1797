//! Engagement metric repository
//!
//! Keeps the latest engagement snapshot per post.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set, sea_query::OnConflict};

use crate::models::engagement_metric::{ActiveModel, Column, Entity as EngagementMetric, Model};

#[derive(Debug, Clone)]
pub struct EngagementMetricRepository {
    db: Arc<DatabaseConnection>,
}

impl EngagementMetricRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert or replace the snapshot for `snapshot.post_id`
    pub async fn upsert(&self, snapshot: Model) -> Result<Model, DbErr> {
        let active = ActiveModel {
            post_id: Set(snapshot.post_id),
            likes: Set(snapshot.likes),
            comments: Set(snapshot.comments),
            shares: Set(snapshot.shares),
            impressions: Set(snapshot.impressions),
            reach: Set(snapshot.reach),
            collected_at: Set(snapshot.collected_at),
        };

        EngagementMetric::insert(active)
            .on_conflict(
                OnConflict::column(Column::PostId)
                    .update_columns([
                        Column::Likes,
                        Column::Comments,
                        Column::Shares,
                        Column::Impressions,
                        Column::Reach,
                        Column::CollectedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        Ok(snapshot)
    }

    pub async fn find_by_post(&self, post_id: uuid::Uuid) -> Result<Option<Model>, DbErr> {
        EngagementMetric::find_by_id(post_id).one(&*self.db).await
    }
}
