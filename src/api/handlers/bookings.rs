use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{
        Booking, BookingStatus, CreateBookingRequest, UpdateBookingRequest,
        UpdateBookingStatusRequest,
    },
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
pub struct BookingDto {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_name: String,
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub check_in_minute: Option<i32>,
    pub check_out_minute: Option<i32>,
    pub nights: i64,
    pub nightly_price: i64,
    pub total_amount: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub created_by: Uuid,
    pub invite_code: Option<String>,
    pub commission: Option<i64>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<Booking> for BookingDto {
    fn from(booking: Booking) -> Self {
        let nights = booking.nights();
        Self {
            id: booking.id,
            property_id: booking.property_id,
            guest_name: booking.guest_name,
            guest_phone: booking.guest_phone,
            check_in: booking.check_in,
            check_out: booking.check_out,
            check_in_minute: booking.check_in_minute,
            check_out_minute: booking.check_out_minute,
            nights,
            nightly_price: booking.nightly_price,
            total_amount: booking.total_amount,
            currency: booking.currency,
            status: booking.status,
            created_by: booking.created_by,
            invite_code: booking.invite_code,
            commission: booking.commission,
            notes: booking.notes,
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    bookings: Vec<BookingDto>,
    total: usize,
}

fn list_response(bookings: Vec<Booking>) -> ListResponse {
    let total = bookings.len();
    ListResponse {
        bookings: bookings.into_iter().map(Into::into).collect(),
        total,
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let bookings = state
        .service_context
        .booking_service
        .list_all(&current.user, params.limit, params.offset)
        .await?;

    Ok(Json(list_response(bookings)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let bookings = state
        .service_context
        .booking_service
        .list_mine(&current.user, params.limit, params.offset)
        .await?;

    Ok(Json(list_response(bookings)))
}

pub async fn list_for_property(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let bookings = state
        .service_context
        .booking_service
        .list_for_property(&current.user, property_id, params.limit, params.offset)
        .await?;

    Ok(Json(list_response(bookings)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDto>> {
    let booking = state
        .service_context
        .booking_service
        .get_booking(&current.user, id)
        .await?;

    Ok(Json(booking.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDto>)> {
    let booking = state
        .service_context
        .booking_service
        .create_booking(&current.user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<BookingDto>> {
    let booking = state
        .service_context
        .booking_service
        .update_booking(&current.user, id, request)
        .await?;

    Ok(Json(booking.into()))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<BookingDto>> {
    let booking = state
        .service_context
        .booking_service
        .update_status(&current.user, id, request.status)
        .await?;

    Ok(Json(booking.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .booking_service
        .delete_booking(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub check_in_minute: Option<i32>,
    pub check_out_minute: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub available: bool,
}

pub async fn check_availability(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>> {
    let available = state
        .service_context
        .booking_service
        .check_availability(
            property_id,
            params.check_in,
            params.check_out,
            params.check_in_minute,
            params.check_out_minute,
            None,
        )
        .await?;

    Ok(Json(AvailabilityResponse {
        property_id,
        check_in: params.check_in,
        check_out: params.check_out,
        available,
    }))
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub property_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub bookings: Vec<BookingDto>,
}

pub async fn month_calendar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((property_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Result<Json<CalendarResponse>> {
    let bookings = state
        .service_context
        .booking_service
        .month_calendar(&current.user, property_id, year, month)
        .await?;

    Ok(Json(CalendarResponse {
        property_id,
        year,
        month,
        bookings: bookings.into_iter().map(Into::into).collect(),
    }))
}
