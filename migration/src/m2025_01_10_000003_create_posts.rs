//! Migration to create the posts table.
//!
//! Posts carry the lifecycle status (draft, approved, published, rejected)
//! together with the publish bookkeeping columns.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::SocialAccountId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Content).text().not_null())
                    .col(ColumnDef::new(Posts::MediaUrls).json().not_null())
                    .col(
                        ColumnDef::new(Posts::IsAiGenerated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Posts::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Posts::ScheduledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Posts::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Posts::PlatformPostId).text().null())
                    .col(ColumnDef::new(Posts::PublishedReason).text().null())
                    .col(ColumnDef::new(Posts::LastError).text().null())
                    .col(
                        ColumnDef::new(Posts::ErrorAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_social_account_id")
                            .from(Posts::Table, Posts::SocialAccountId)
                            .to(SocialAccounts::Table, SocialAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_social_account_id")
                    .table(Posts::Table)
                    .col(Posts::SocialAccountId)
                    .to_owned(),
            )
            .await?;

        // Dispatchers look up due posts by status and schedule
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_status_scheduled_at")
                    .table(Posts::Table)
                    .col(Posts::Status)
                    .col(Posts::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    SocialAccountId,
    Content,
    MediaUrls,
    IsAiGenerated,
    Status,
    ScheduledAt,
    PublishedAt,
    PlatformPostId,
    PublishedReason,
    LastError,
    ErrorAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SocialAccounts {
    Table,
    Id,
}
