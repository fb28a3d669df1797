//! Migration to create the social_accounts table.
//!
//! Social accounts are user-owned links to an Instagram, Facebook or LinkedIn
//! account, with the platform access token stored encrypted.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SocialAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::Platform)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SocialAccounts::AccountId).text().not_null())
                    .col(ColumnDef::new(SocialAccounts::AccountName).text().null())
                    .col(
                        ColumnDef::new(SocialAccounts::AccessTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SocialAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_social_accounts_user_platform_account")
                    .table(SocialAccounts::Table)
                    .col(SocialAccounts::UserId)
                    .col(SocialAccounts::Platform)
                    .col(SocialAccounts::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_social_accounts_user_id")
                    .table(SocialAccounts::Table)
                    .col(SocialAccounts::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SocialAccounts {
    Table,
    Id,
    UserId,
    Platform,
    AccountId,
    AccountName,
    AccessTokenCiphertext,
    TokenExpiresAt,
    CreatedAt,
    UpdatedAt,
}
