//! Engagement metric handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, Principal, UserHeader};
use crate::error::{ApiError, not_found, validation_error};
use crate::models::engagement_metric::Model as EngagementMetricModel;
use crate::repositories::EngagementMetricRepository;
use crate::server::AppState;

/// Engagement snapshot submitted for a post
#[derive(Debug, Deserialize, ToSchema)]
pub struct EngagementMetricsRequest {
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub reach: i64,
    /// Defaults to the time the snapshot is received
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EngagementMetricsResponse {
    #[schema(value_type = String)]
    pub post_id: Uuid,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub impressions: i64,
    pub reach: i64,
    pub collected_at: DateTime<Utc>,
}

impl From<EngagementMetricModel> for EngagementMetricsResponse {
    fn from(model: EngagementMetricModel) -> Self {
        Self {
            post_id: model.post_id,
            likes: model.likes,
            comments: model.comments,
            shares: model.shares,
            impressions: model.impressions,
            reach: model.reach,
            collected_at: model.collected_at,
        }
    }
}

fn validate_counts(body: &EngagementMetricsRequest) -> Result<(), ApiError> {
    let negative: Vec<&str> = [
        ("likes", body.likes),
        ("comments", body.comments),
        ("shares", body.shares),
        ("impressions", body.impressions),
        ("reach", body.reach),
    ]
    .into_iter()
    .filter(|(_, value)| *value < 0)
    .map(|(name, _)| name)
    .collect();

    if negative.is_empty() {
        Ok(())
    } else {
        Err(validation_error(
            "Engagement counts must be non-negative",
            json!({ "fields": negative }),
        ))
    }
}

/// Replace the engagement snapshot of a post
#[utoipa::path(
    put,
    path = "/posts/{id}/metrics",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    request_body = EngagementMetricsRequest,
    responses(
        (status = 200, description = "Snapshot stored", body = EngagementMetricsResponse),
        (status = 400, description = "Negative counts", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn put_post_metrics(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
    payload: Result<Json<EngagementMetricsRequest>, JsonRejection>,
) -> Result<Json<EngagementMetricsResponse>, ApiError> {
    let Json(body) = payload?;
    validate_counts(&body)?;

    // Ownership check; a foreign post is indistinguishable from a missing one
    state.post_controller().get(principal.user_id(), id).await?;

    let snapshot = EngagementMetricRepository::new(Arc::new(state.db.clone()))
        .upsert(EngagementMetricModel {
            post_id: id,
            likes: body.likes,
            comments: body.comments,
            shares: body.shares,
            impressions: body.impressions,
            reach: body.reach,
            collected_at: body.collected_at.unwrap_or_else(Utc::now),
        })
        .await?;

    Ok(Json(snapshot.into()))
}

/// Fetch the latest engagement snapshot of a post
#[utoipa::path(
    get,
    path = "/posts/{id}/metrics",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Post id"), UserHeader),
    responses(
        (status = 200, description = "Latest snapshot", body = EngagementMetricsResponse),
        (status = 404, description = "Post or snapshot not found", body = ApiError)
    ),
    tag = "posts"
)]
pub async fn get_post_metrics(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<EngagementMetricsResponse>, ApiError> {
    state.post_controller().get(principal.user_id(), id).await?;

    EngagementMetricRepository::new(Arc::new(state.db.clone()))
        .find_by_post(id)
        .await?
        .map(|snapshot| Json(snapshot.into()))
        .ok_or_else(|| not_found("engagement metrics", &id.to_string()))
}
