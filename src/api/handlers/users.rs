use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateUserRequest, UpdateUserRequest, User, UserRole},
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
pub struct UserDto {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub role: UserRole,
    pub managed_properties: Vec<Uuid>,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone: user.phone,
            name: user.name,
            role: user.role,
            managed_properties: user.managed_properties,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    users: Vec<UserDto>,
    total: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let users = state
        .service_context
        .user_service
        .list_users(&current.user, params.limit, params.offset)
        .await?;

    let total = users.len();
    let users: Vec<UserDto> = users.into_iter().map(Into::into).collect();

    Ok(Json(ListResponse { users, total }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>> {
    let user = state
        .service_context
        .user_service
        .get_user(&current.user, id)
        .await?;

    Ok(Json(user.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>)> {
    let user = state
        .service_context
        .user_service
        .create_user(&current.user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>> {
    let user = state
        .service_context
        .user_service
        .update_user(&current.user, id, request)
        .await?;

    Ok(Json(user.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .user_service
        .delete_user(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordDto {
    pub password: String,
}

pub async fn set_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(dto): Json<SetPasswordDto>,
) -> Result<StatusCode> {
    state
        .service_context
        .user_service
        .set_password(&current.user, id, &dto.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
