//! # Authentication
//!
//! Operator bearer authentication and user principal resolution for
//! protected API endpoints. The resolved [`UserId`] is placed in request
//! extensions and handed explicitly to every repository call.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, validation_error};
use crate::server::AppState;

/// Header naming the user a request acts for
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated user identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Marker type for authenticated operator requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

/// The principal of an authenticated request
#[derive(Debug, Clone, Copy)]
pub struct Principal(pub UserId);

impl Principal {
    pub fn user_id(&self) -> i64 {
        self.0.0
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware that validates bearer tokens and the user header
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = extract_bearer_token(headers)?;
    validate_token(&config, token)?;

    let user = extract_user_id(headers)?;
    tracing::debug!(user_id = user.0, "Authenticated operator request");

    request.extensions_mut().insert(Principal(user));
    request.extensions_mut().insert(OperatorAuth);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_user_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let header_value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ "X-User-Id": "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid user header",
                serde_json::json!({ "X-User-Id": "Header must be valid UTF-8" }),
            )
        })?;

    match header_value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(UserId(id)),
        _ => Err(validation_error(
            "Invalid user ID",
            serde_json::json!({ "X-User-Id": "Must be a positive integer" }),
        )),
    }
}

/// OpenAPI header parameter for X-User-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct UserHeader {
    /// Identifier of the user the request acts for
    #[serde(rename = "X-User-Id")]
    #[param(rename = "X-User-Id", value_type = i64)]
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| unauthorized(Some("User context missing")))
    }
}

impl<S> FromRequestParts<S> for OperatorAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}
