use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreatePaymentRequest, Payment, PaymentMethod, PaymentSummary},
    error::Result,
};

use super::bookings::BookingDto;

#[derive(Debug, Serialize)]
pub struct PaymentDto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub recorded_by: Uuid,
    pub paid_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            amount: payment.amount,
            currency: payment.currency,
            method: payment.method,
            reference: payment.reference,
            recorded_by: payment.recorded_by,
            paid_on: payment.paid_on,
            notes: payment.notes,
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogPaymentDto {
    pub amount: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogPaymentResponse {
    pub payment: PaymentDto,
    pub summary: PaymentSummary,
}

pub async fn log_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
    Json(dto): Json<LogPaymentDto>,
) -> Result<(StatusCode, Json<LogPaymentResponse>)> {
    let request = CreatePaymentRequest {
        booking_id,
        amount: dto.amount,
        method: dto.method,
        reference: dto.reference,
        paid_on: dto.paid_on,
        notes: dto.notes,
    };

    let (payment, summary) = state
        .service_context
        .payment_service
        .log_payment(&current.user, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LogPaymentResponse {
            payment: payment.into(),
            summary,
        }),
    ))
}

pub async fn list_for_booking(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentDto>>> {
    let payments = state
        .service_context
        .payment_service
        .list_for_booking(&current.user, booking_id)
        .await?;

    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentSummary>> {
    let summary = state
        .service_context
        .payment_service
        .payment_status(&current.user, booking_id)
        .await?;

    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct BookingHistoryResponse {
    pub booking: BookingDto,
    pub payments: Vec<PaymentDto>,
    pub summary: PaymentSummary,
}

/// The booking with its full payment trail and derived summary, the
/// everything-about-this-stay view.
pub async fn history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingHistoryResponse>> {
    let (booking, payments, summary) = state
        .service_context
        .payment_service
        .history(&current.user, booking_id)
        .await?;

    Ok(Json(BookingHistoryResponse {
        booking: booking.into(),
        payments: payments.into_iter().map(Into::into).collect(),
        summary,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .service_context
        .payment_service
        .delete_payment(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
