use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per post: the latest collected snapshot, keyed by post id
        manager
            .create_table(
                Table::create()
                    .table(EngagementMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EngagementMetrics::PostId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::Likes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::Comments)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::Shares)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::Reach)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EngagementMetrics::CollectedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_engagement_metrics_post_id")
                            .from(EngagementMetrics::Table, EngagementMetrics::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EngagementMetrics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EngagementMetrics {
    Table,
    PostId,
    Likes,
    Comments,
    Shares,
    Impressions,
    Reach,
    CollectedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
}
