use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateInviteCodeRequest, CreatePropertyRequest, InviteCode, Property, UpdatePropertyRequest},
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
pub struct PropertyDto {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub owner_id: Uuid,
    pub nightly_price: i64,
    pub currency: String,
    pub bedrooms: i32,
    pub max_guests: i32,
    pub active: bool,
    pub created_at: String,
}

impl From<Property> for PropertyDto {
    fn from(property: Property) -> Self {
        Self {
            id: property.id,
            name: property.name,
            address: property.address,
            owner_id: property.owner_id,
            nightly_price: property.nightly_price,
            currency: property.currency,
            bedrooms: property.bedrooms,
            max_guests: property.max_guests,
            active: property.active,
            created_at: property.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    properties: Vec<PropertyDto>,
    total: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let properties = state
        .service_context
        .property_service
        .list_visible(&current.user, params.limit, params.offset)
        .await?;

    let total = properties.len();
    let properties: Vec<PropertyDto> = properties.into_iter().map(Into::into).collect();

    Ok(Json(ListResponse { properties, total }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyDto>> {
    let property = state
        .service_context
        .property_service
        .get_property(&current.user, id)
        .await?;

    Ok(Json(property.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<PropertyDto>)> {
    let property = state
        .service_context
        .property_service
        .create_property(&current.user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(property.into())))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePropertyRequest>,
) -> Result<Json<PropertyDto>> {
    let property = state
        .service_context
        .property_service
        .update_property(&current.user, id, request)
        .await?;

    Ok(Json(property.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .property_service
        .delete_property(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct InviteCodeDto {
    pub id: Uuid,
    pub code: String,
    pub property_id: Uuid,
    pub expires_at: Option<String>,
    pub max_uses: i64,
    pub use_count: i64,
    pub active: bool,
    pub created_at: String,
}

impl From<InviteCode> for InviteCodeDto {
    fn from(invite: InviteCode) -> Self {
        Self {
            id: invite.id,
            code: invite.code,
            property_id: invite.property_id,
            expires_at: invite.expires_at.map(|at| at.to_rfc3339()),
            max_uses: invite.max_uses,
            use_count: invite.use_count,
            active: invite.active,
            created_at: invite.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInviteDto {
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub max_uses: Option<i64>,
}

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
    Json(dto): Json<CreateInviteDto>,
) -> Result<(StatusCode, Json<InviteCodeDto>)> {
    let request = CreateInviteCodeRequest {
        property_id,
        expires_at: dto.expires_at,
        max_uses: dto.max_uses,
    };

    let invite = state
        .service_context
        .property_service
        .create_invite(&current.user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(invite.into())))
}

pub async fn list_invites(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Vec<InviteCodeDto>>> {
    let invites = state
        .service_context
        .property_service
        .list_invites(&current.user, property_id)
        .await?;

    Ok(Json(invites.into_iter().map(Into::into).collect()))
}

pub async fn claim_invite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(code): Path<String>,
) -> Result<Json<PropertyDto>> {
    let property = state
        .service_context
        .property_service
        .claim_invite(&current.user, &code)
        .await?;

    Ok(Json(property.into()))
}

pub async fn deactivate_invite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    state
        .service_context
        .property_service
        .deactivate_invite(&current.user, &code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
