//! Migration to create the oauth_states table.
//!
//! Each row is a single-use OAuth handshake binding a random state key to the
//! user and platform that initiated the connect flow.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OAuthStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OAuthStates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OAuthStates::StateKey).string().not_null())
                    .col(ColumnDef::new(OAuthStates::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(OAuthStates::Platform)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OAuthStates::AuthToken).text().null())
                    .col(
                        ColumnDef::new(OAuthStates::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuthStates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // A state key identifies at most one handshake
        manager
            .create_index(
                Index::create()
                    .name("idx_oauth_states_state_key")
                    .table(OAuthStates::Table)
                    .col(OAuthStates::StateKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lazy cleanup scans by expiry
        manager
            .create_index(
                Index::create()
                    .name("idx_oauth_states_expires_at")
                    .table(OAuthStates::Table)
                    .col(OAuthStates::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OAuthStates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OAuthStates {
    #[sea_orm(iden = "oauth_states")]
    Table,
    Id,
    StateKey,
    UserId,
    Platform,
    AuthToken,
    ExpiresAt,
    CreatedAt,
}
