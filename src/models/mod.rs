//! # Data Models
//!
//! This module contains all the data models used throughout the postpilot API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod engagement_metric;
pub mod oauth_state;
pub mod platform;
pub mod post;
pub mod social_account;

pub use engagement_metric::Entity as EngagementMetric;
pub use oauth_state::Entity as OAuthState;
pub use platform::Platform;
pub use post::{Entity as Post, PostStatus};
pub use social_account::Entity as SocialAccount;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "postpilot".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
