//! # Social Account Handlers
//!
//! Link, list and unlink the calling user's social accounts. Access tokens
//! are accepted on creation but never returned.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, Principal, UserHeader};
use crate::error::{ApiError, not_found, validation_error};
use crate::models::Platform;
use crate::models::social_account::Model as SocialAccountModel;
use crate::repositories::NewSocialAccount;
use crate::server::AppState;

const MAX_ACCOUNT_ID_LEN: usize = 255;

/// Request body for linking a social account
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSocialAccountRequest {
    pub platform: Platform,
    /// Platform-side account identifier
    pub account_id: String,
    pub account_name: Option<String>,
    /// Platform access token; stored encrypted
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Social account as exposed by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SocialAccountResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub platform: Platform,
    pub account_id: String,
    pub account_name: Option<String>,
    /// Whether an encrypted access token is stored
    pub has_access_token: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SocialAccountModel> for SocialAccountResponse {
    fn from(model: SocialAccountModel) -> Self {
        Self {
            id: model.id,
            platform: model.platform,
            account_id: model.account_id,
            account_name: model.account_name,
            has_access_token: model.access_token_ciphertext.is_some(),
            token_expires_at: model.token_expires_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SocialAccountsResponse {
    pub accounts: Vec<SocialAccountResponse>,
}

/// Link a social account to the calling user
#[utoipa::path(
    post,
    path = "/social-accounts",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = CreateSocialAccountRequest,
    responses(
        (status = 201, description = "Social account linked", body = SocialAccountResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid authorization token", body = ApiError),
        (status = 409, description = "Account already linked", body = ApiError)
    ),
    tag = "social-accounts"
)]
pub async fn create_social_account(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    payload: Result<Json<CreateSocialAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SocialAccountResponse>), ApiError> {
    let Json(body) = payload?;
    let account_id = body.account_id.trim().to_string();
    if account_id.is_empty() || account_id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(validation_error(
            "Invalid account_id",
            json!({ "account_id": format!("must be 1 to {} characters", MAX_ACCOUNT_ID_LEN) }),
        ));
    }

    let account = state
        .social_accounts()
        .create(
            principal.user_id(),
            NewSocialAccount {
                platform: body.platform,
                account_id,
                account_name: body.account_name,
                access_token: body.access_token.filter(|token| !token.is_empty()),
                token_expires_at: body.token_expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// List the calling user's social accounts
#[utoipa::path(
    get,
    path = "/social-accounts",
    security(("bearer_auth" = [])),
    params(UserHeader),
    responses(
        (status = 200, description = "Social accounts", body = SocialAccountsResponse),
        (status = 401, description = "Missing or invalid authorization token", body = ApiError)
    ),
    tag = "social-accounts"
)]
pub async fn list_social_accounts(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
) -> Result<Json<SocialAccountsResponse>, ApiError> {
    let accounts = state
        .social_accounts()
        .list_by_user(principal.user_id())
        .await?;

    Ok(Json(SocialAccountsResponse {
        accounts: accounts.into_iter().map(Into::into).collect(),
    }))
}

/// Unlink a social account, deleting its posts
#[utoipa::path(
    delete,
    path = "/social-accounts/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Social account id"),
        UserHeader
    ),
    responses(
        (status = 204, description = "Social account deleted"),
        (status = 401, description = "Missing or invalid authorization token", body = ApiError),
        (status = 404, description = "Social account not found", body = ApiError)
    ),
    tag = "social-accounts"
)]
pub async fn delete_social_account(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state
        .social_accounts()
        .delete_owned(principal.user_id(), id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("social account", &id.to_string()))
    }
}
