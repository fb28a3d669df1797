//! # Connect Handlers
//!
//! The OAuth handshake round trip: `POST /connect/{platform}` issues a
//! single-use state token, and `GET /oauth/callback/{platform}` consumes it
//! when the platform redirects back. The authorization code exchange itself
//! happens downstream of this service.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{OperatorAuth, Principal, UserHeader};
use crate::error::{ApiError, invalid_state, validation_error};
use crate::models::Platform;
use crate::repositories::OAuthStateRepository;
use crate::server::AppState;

const MAX_AUTH_TOKEN_LEN: usize = 4096;

/// Optional body for starting a connect flow
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartConnectRequest {
    /// Opaque pre-authentication token carried through the redirect
    pub auth_token: Option<String>,
}

/// Issued OAuth handshake
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartConnectResponse {
    /// State value to pass as the OAuth `state` parameter
    pub state: String,
    pub platform: Platform,
    pub expires_at: DateTime<Utc>,
}

/// Query parameters appended by the platform on redirect
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Handshake payload recovered by a successful callback
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthCallbackResponse {
    pub user_id: i64,
    pub platform: Platform,
    pub auth_token: Option<String>,
    /// Authorization code to exchange for platform tokens
    pub code: String,
}

pub(crate) fn parse_platform(raw: &str) -> Result<Platform, ApiError> {
    raw.parse::<Platform>().map_err(|err| {
        validation_error(
            "Unsupported platform",
            json!({ "platform": err.to_string() }),
        )
    })
}

fn oauth_states(state: &AppState) -> OAuthStateRepository {
    OAuthStateRepository::new(Arc::new(state.db.clone()))
        .with_ttl(Duration::minutes(state.config.oauth_state_ttl_minutes))
}

/// Start an OAuth connect flow
///
/// Issues a single-use state token bound to the calling user and platform.
#[utoipa::path(
    post,
    path = "/connect/{platform}",
    security(("bearer_auth" = [])),
    params(
        ("platform" = String, Path, description = "Platform to connect: instagram, facebook or linkedin"),
        UserHeader
    ),
    request_body(content = StartConnectRequest, description = "Optional pre-authentication token"),
    responses(
        (status = 200, description = "Handshake created", body = StartConnectResponse),
        (status = 400, description = "Unsupported platform or invalid body", body = ApiError),
        (status = 401, description = "Missing or invalid authorization token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connect"
)]
pub async fn start_connect(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(platform): Path<String>,
    body: Bytes,
) -> Result<Json<StartConnectResponse>, ApiError> {
    let platform = parse_platform(&platform)?;

    let request: StartConnectRequest = if body.is_empty() {
        StartConnectRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                format!("Invalid JSON: {}", err).as_str(),
            )
        })?
    };

    let auth_token = request.auth_token.filter(|token| !token.is_empty());
    if auth_token
        .as_ref()
        .is_some_and(|token| token.len() > MAX_AUTH_TOKEN_LEN)
    {
        return Err(validation_error(
            "auth_token is too long",
            json!({ "auth_token": format!("must be at most {} bytes", MAX_AUTH_TOKEN_LEN) }),
        ));
    }

    let handshake = oauth_states(&state)
        .create_state(principal.user_id(), platform, auth_token)
        .await?;

    tracing::info!(
        user_id = principal.user_id(),
        platform = %platform,
        state_id = %handshake.id,
        "OAuth flow initiated"
    );

    Ok(Json(StartConnectResponse {
        state: handshake.state_key,
        platform,
        expires_at: handshake.expires_at,
    }))
}

/// Complete an OAuth connect flow
///
/// Public endpoint reached by the platform redirect. The state token is
/// consumed before any other check so it can never be replayed.
#[utoipa::path(
    get,
    path = "/oauth/callback/{platform}",
    params(
        ("platform" = String, Path, description = "Platform that issued the redirect"),
        OAuthCallbackQuery
    ),
    responses(
        (status = 200, description = "Handshake consumed", body = OAuthCallbackResponse),
        (status = 400, description = "Invalid or expired state, provider denial, or missing code", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connect"
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Json<OAuthCallbackResponse>, ApiError> {
    let platform = parse_platform(&platform)?;

    let state_key = query
        .state
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| invalid_state("Missing state parameter"))?;

    let payload = oauth_states(&state)
        .consume_state(state_key)
        .await?
        .ok_or_else(|| {
            tracing::warn!(platform = %platform, "OAuth callback with unknown or expired state");
            invalid_state("Invalid or expired state")
        })?;

    if payload.platform != platform {
        tracing::warn!(
            user_id = payload.user_id,
            expected = %payload.platform,
            received = %platform,
            "OAuth callback platform mismatch"
        );
        return Err(invalid_state("State was issued for a different platform").with_details(
            json!({ "expected": payload.platform, "received": platform }),
        ));
    }

    if let Some(error) = query.error {
        tracing::info!(
            user_id = payload.user_id,
            platform = %platform,
            error = %error,
            "OAuth authorization denied by platform"
        );
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "OAUTH_DENIED",
            "Authorization was denied by the platform",
        )
        .with_details(json!({
            "error": error,
            "error_description": query.error_description,
        })));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            validation_error(
                "Missing authorization code",
                json!({ "code": "Required query parameter is missing" }),
            )
        })?;

    tracing::info!(
        user_id = payload.user_id,
        platform = %platform,
        "OAuth callback accepted"
    );

    Ok(Json(OAuthCallbackResponse {
        user_id: payload.user_id,
        platform: payload.platform,
        auth_token: payload.auth_token,
        code,
    }))
}
