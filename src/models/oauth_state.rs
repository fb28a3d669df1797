//! # OAuth State Model
//!
//! This module contains the OAuth handshake entity: a short-lived, single-use
//! correlation token carried through the provider redirect.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use uuid::Uuid;

use super::platform::Platform;

/// OAuth handshake entity for storing connect-flow state tokens
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth_states")]
pub struct Model {
    /// Primary key UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Random state token generated for CSRF protection (unique)
    pub state_key: String,

    /// User that initiated the connect flow
    pub user_id: i64,

    /// Platform being connected
    pub platform: Platform,

    /// Opaque pre-authentication token carried through the redirect
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,

    /// Expiration timestamp
    pub expires_at: chrono::DateTime<chrono::Utc>,

    /// When the state was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Payload recovered when a handshake is consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub user_id: i64,
    pub platform: Platform,
    pub auth_token: Option<String>,
}

impl From<Model> for HandshakePayload {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            platform: model.platform,
            auth_token: model.auth_token,
        }
    }
}
