//! Database migrations for postpilot.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_oauth_states;
mod m2025_01_10_000002_create_social_accounts;
mod m2025_01_10_000003_create_posts;
mod m2025_01_10_000004_create_engagement_metrics;
mod m2025_01_12_000100_add_post_publish_claim;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_oauth_states::Migration),
            Box::new(m2025_01_10_000002_create_social_accounts::Migration),
            Box::new(m2025_01_10_000003_create_posts::Migration),
            Box::new(m2025_01_10_000004_create_engagement_metrics::Migration),
            Box::new(m2025_01_12_000100_add_post_publish_claim::Migration),
        ]
    }
}
