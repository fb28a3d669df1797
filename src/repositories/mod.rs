//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! postpilot entities. Every user-facing lookup takes the owning user id
//! explicitly.

pub mod engagement_metric;
pub mod oauth_state;
pub mod post;
pub mod social_account;

pub use engagement_metric::EngagementMetricRepository;
pub use oauth_state::OAuthStateRepository;
pub use post::{NewPost, PostListFilter, PostRepository, PublishedFields};
pub use social_account::{NewSocialAccount, SocialAccountError, SocialAccountRepository};
