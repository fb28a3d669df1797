//! # Post Handlers
//!
//! CRUD and lifecycle transitions for posts. Every handler resolves the
//! caller's [`Principal`] and passes the user id explicitly to the
//! [`PostLifecycleController`](crate::lifecycle::PostLifecycleController).

use axum::{
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::page_limit;
use crate::auth::{OperatorAuth, Principal, UserHeader};
use crate::cursor::decode_cursor;
use crate::error::ApiError;
use crate::models::PostStatus;
use crate::models::post::Model as PostModel;
use crate::repositories::{NewPost, PostListFilter};
use crate::server::AppState;

/// Request body for creating a draft post
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[schema(value_type = String)]
    pub social_account_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub is_ai_generated: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request body for updating the schedule; `null` clears it
#[derive(Debug, Deserialize, ToSchema)]
pub struct SchedulePostRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request body for publishing a post
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PublishPostRequest {
    /// Publish a draft directly, skipping approval
    #[serde(default)]
    pub immediate: bool,
}

/// Request body for the mark-as-published override
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkPublishedRequest {
    /// Audit note explaining the out-of-band publication
    pub reason: String,
    pub platform_post_id: Option<String>,
}

/// Query parameters for listing posts
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    pub status: Option<PostStatus>,
    #[param(value_type = Option<String>)]
    pub social_account_id: Option<Uuid>,
    /// Page size (default 50, max 100)
    pub limit: Option<u64>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
}

/// Post as exposed by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub social_account_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub is_ai_generated: bool,
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub platform_post_id: Option<String>,
    pub published_reason: Option<String>,
    pub last_error: Option<String>,
    pub error_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostModel> for PostResponse {
    fn from(model: PostModel) -> Self {
        Self {
            media_urls: model.media_url_list(),
            id: model.id,
            social_account_id: model.social_account_id,
            content: model.content,
            is_ai_generated: model.is_ai_generated,
            status: model.status,
            scheduled_at: model.scheduled_at,
            published_at: model.published_at,
            platform_post_id: model.platform_post_id,
            published_reason: model.published_reason,
            last_error: model.last_error,
            error_at: model.error_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One page of posts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostsResponse {
    pub posts: Vec<PostResponse>,
    /// Cursor for the next page, absent on the last page
    pub next_cursor: Option<String>,
}

/// Create a draft post
#[utoipa::path(
    post,
    path = "/posts",
    security(("bearer_auth" = [])),
    params(UserHeader),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created in draft", body = PostResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Social account not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let Json(body) = payload?;
    let post = state
        .post_controller()
        .create(
            principal.user_id(),
            NewPost {
                social_account_id: body.social_account_id,
                content: body.content,
                media_urls: body.media_urls,
                is_ai_generated: body.is_ai_generated,
                scheduled_at: body.scheduled_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// List the caller's posts
#[utoipa::path(
    get,
    path = "/posts",
    security(("bearer_auth" = [])),
    params(ListPostsQuery, UserHeader),
    responses(
        (status = 200, description = "Page of posts", body = PostsResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostsResponse>, ApiError> {
    let limit = page_limit(query.limit)?;
    let cursor = query.cursor.as_deref().map(decode_cursor).transpose()?;
    let filter = PostListFilter {
        status: query.status,
        social_account_id: query.social_account_id,
    };

    let (posts, next_cursor) = state
        .post_controller()
        .list(principal.user_id(), &filter, cursor, limit)
        .await?;

    Ok(Json(PostsResponse {
        posts: posts.into_iter().map(Into::into).collect(),
        next_cursor,
    }))
}

/// Fetch a single post
#[utoipa::path(
    get,
    path = "/posts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_controller().get(principal.user_id(), id).await?;
    Ok(Json(post.into()))
}

/// Delete a post in any status
///
/// Published posts are removed locally only; nothing is retracted on the platform.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .post_controller()
        .delete(principal.user_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set or clear the requested publish time
#[utoipa::path(
    put,
    path = "/posts/{id}/schedule",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    request_body = SchedulePostRequest,
    responses(
        (status = 200, description = "Schedule updated", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 409, description = "Post is published or rejected", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn schedule_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
    payload: Result<Json<SchedulePostRequest>, JsonRejection>,
) -> Result<Json<PostResponse>, ApiError> {
    let Json(body) = payload?;
    let post = state
        .post_controller()
        .schedule(principal.user_id(), id, body.scheduled_at)
        .await?;
    Ok(Json(post.into()))
}

/// Approve a draft post
#[utoipa::path(
    post,
    path = "/posts/{id}/approve",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    responses(
        (status = 200, description = "Post approved", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 409, description = "Invalid transition or concurrent modification", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn approve_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_controller()
        .approve(principal.user_id(), id)
        .await?;
    Ok(Json(post.into()))
}

/// Reject a draft or approved post
#[utoipa::path(
    post,
    path = "/posts/{id}/reject",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    responses(
        (status = 200, description = "Post rejected", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 409, description = "Invalid transition or concurrent modification", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn reject_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_controller()
        .reject(principal.user_id(), id)
        .await?;
    Ok(Json(post.into()))
}

/// Publish a post through the publish gateway
#[utoipa::path(
    post,
    path = "/posts/{id}/publish",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    request_body(content = PublishPostRequest, description = "Set `immediate` to publish a draft directly"),
    responses(
        (status = 200, description = "Post published", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 409, description = "Invalid transition, or another publish is in flight", body = ApiError),
        (status = 502, description = "Platform rejected the post; failure recorded", body = ApiError),
        (status = 503, description = "Publishing is not configured", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn publish_post(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<PostResponse>, ApiError> {
    let request: PublishPostRequest = if body.is_empty() {
        PublishPostRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                format!("Invalid JSON: {}", err).as_str(),
            )
        })?
    };
    let post = state
        .post_controller()
        .publish(principal.user_id(), id, request.immediate)
        .await?;
    Ok(Json(post.into()))
}

/// Record a publication that happened outside this service
#[utoipa::path(
    post,
    path = "/posts/{id}/mark-published",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    request_body = MarkPublishedRequest,
    responses(
        (status = 200, description = "Post marked as published", body = PostResponse),
        (status = 400, description = "Missing reason", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 409, description = "Invalid transition or concurrent modification", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn mark_post_published(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
    payload: Result<Json<MarkPublishedRequest>, JsonRejection>,
) -> Result<Json<PostResponse>, ApiError> {
    let Json(body) = payload?;
    let post = state
        .post_controller()
        .mark_published(principal.user_id(), id, &body.reason, body.platform_post_id)
        .await?;
    Ok(Json(post.into()))
}
