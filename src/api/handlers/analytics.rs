use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::Result,
    service::{DashboardStats, PropertyReport},
};

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<DashboardStats>> {
    let today = Utc::now().date_naive();
    let stats = state
        .service_context
        .analytics_service
        .dashboard(&current.user, today)
        .await?;

    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn property_report(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
    Query(params): Query<ReportParams>,
) -> Result<Json<PropertyReport>> {
    let report = state
        .service_context
        .analytics_service
        .property_report(&current.user, property_id, params.from, params.to)
        .await?;

    Ok(Json(report))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response> {
    let csv = state
        .service_context
        .analytics_service
        .export_csv(&current.user)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"bookings.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
