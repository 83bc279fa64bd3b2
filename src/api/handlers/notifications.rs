use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Notification, NotificationKind},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub booking_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationDto {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            message: notification.message,
            booking_id: notification.booking_id,
            property_id: notification.property_id,
            read: notification.read,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    notifications: Vec<NotificationDto>,
    unread: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let notifications = state
        .service_context
        .notification_repo
        .list_for_user(current.user.id, params.limit, params.offset)
        .await?;
    let unread = state
        .service_context
        .notification_repo
        .unread_count(current.user.id)
        .await?;

    Ok(Json(ListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread,
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>> {
    let unread = state
        .service_context
        .notification_repo
        .unread_count(current.user.id)
        .await?;

    Ok(Json(json!({ "unread": unread })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .notification_repo
        .mark_read(id, current.user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode> {
    state
        .service_context
        .notification_repo
        .mark_all_read(current.user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
