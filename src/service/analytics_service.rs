use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::BookingConfig,
    domain::*,
    error::{AppError, Result},
    repository::{BookingRepository, PaymentRepository, PropertyRepository},
};

/// Aggregation reads everything through the repositories, so a single bad
/// lookup never sinks a whole report: failed items are logged and skipped.
pub struct AnalyticsService {
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    config: BookingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_properties: usize,
    pub total_bookings: usize,
    pub upcoming_bookings: usize,
    pub active_stays: usize,
    pub pending_confirmation: usize,
    /// Minor units actually received across all bookings.
    pub total_collected: i64,
    /// Minor units still due on bookings that hold their dates.
    pub total_outstanding: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyReport {
    pub property_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub bookings: usize,
    /// Nights falling inside the report window.
    pub nights_booked: i64,
    pub occupancy_rate: f64,
    pub revenue_expected: i64,
    pub revenue_collected: i64,
}

const AGGREGATE_PAGE: i64 = 10_000;

impl AnalyticsService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        config: BookingConfig,
    ) -> Self {
        Self {
            properties,
            bookings,
            payments,
            config,
        }
    }

    pub async fn dashboard(&self, actor: &User, today: NaiveDate) -> Result<DashboardStats> {
        let properties = self.visible_properties(actor).await?;

        let mut stats = DashboardStats {
            total_properties: properties.len(),
            total_bookings: 0,
            upcoming_bookings: 0,
            active_stays: 0,
            pending_confirmation: 0,
            total_collected: 0,
            total_outstanding: 0,
        };

        for property in &properties {
            let bookings = self
                .bookings
                .list_for_property(property.id, AGGREGATE_PAGE, 0)
                .await?;

            for booking in &bookings {
                stats.total_bookings += 1;
                if booking.status.occupies_dates() && booking.check_in > today {
                    stats.upcoming_bookings += 1;
                }
                if booking.status == BookingStatus::CheckedIn {
                    stats.active_stays += 1;
                }
                if booking.status == BookingStatus::PendingConfirmation {
                    stats.pending_confirmation += 1;
                }

                match self.payments.list_for_booking(booking.id).await {
                    Ok(payments) => {
                        let summary =
                            PaymentSummary::derive(booking.id, booking.total_amount, &payments);
                        stats.total_collected += summary.total_paid;
                        if booking.status.occupies_dates() {
                            stats.total_outstanding += summary.total_due;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Skipping payment totals for booking {}: {}",
                            booking.id,
                            e
                        );
                    }
                }
            }
        }

        Ok(stats)
    }

    pub async fn property_report(
        &self,
        actor: &User,
        property_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PropertyReport> {
        if from >= to {
            return Err(AppError::Validation(
                "Report window must end after it starts".to_string(),
            ));
        }

        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }

        let (scan_from, scan_to) = scan_window(from, to, self.config.lookback_days);
        let bookings = self
            .bookings
            .list_in_window(property_id, scan_from, scan_to)
            .await?;

        let mut report = PropertyReport {
            property_id,
            from,
            to,
            bookings: 0,
            nights_booked: 0,
            occupancy_rate: 0.0,
            revenue_expected: 0,
            revenue_collected: 0,
        };

        for booking in &bookings {
            if !booking.status.occupies_dates() {
                continue;
            }
            if !ranges_overlap(booking.check_in, booking.check_out, from, to) {
                continue;
            }

            report.bookings += 1;
            let overlap_start = booking.check_in.max(from);
            let overlap_end = booking.check_out.min(to);
            report.nights_booked += (overlap_end - overlap_start).num_days();
            report.revenue_expected += booking.total_amount;

            match self.payments.list_for_booking(booking.id).await {
                Ok(payments) => {
                    report.revenue_collected += payments.iter().map(|p| p.amount).sum::<i64>();
                }
                Err(e) => {
                    tracing::warn!("Skipping payments for booking {}: {}", booking.id, e);
                }
            }
        }

        let window_nights = (to - from).num_days();
        if window_nights > 0 {
            report.occupancy_rate = report.nights_booked as f64 / window_nights as f64;
        }

        Ok(report)
    }

    /// Master export of every booking with its derived payment columns.
    /// Rows whose payment lookup fails keep their booking columns and leave
    /// the payment columns empty.
    pub async fn export_csv(&self, actor: &User) -> Result<String> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "booking_id",
                "property",
                "guest_name",
                "guest_phone",
                "check_in",
                "check_out",
                "nights",
                "status",
                "currency",
                "total_amount",
                "total_paid",
                "total_due",
                "payment_status",
                "payment_count",
                "last_payment_date",
                "created_at",
            ])
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        let bookings = self.bookings.list(AGGREGATE_PAGE, 0).await?;
        for booking in &bookings {
            let property_name = match self.properties.find_by_id(booking.property_id).await {
                Ok(Some(property)) => property.name,
                Ok(None) => "unknown".to_string(),
                Err(e) => {
                    tracing::warn!("Property lookup failed for booking {}: {}", booking.id, e);
                    "unknown".to_string()
                }
            };

            let summary = match self.payments.list_for_booking(booking.id).await {
                Ok(payments) => Some(PaymentSummary::derive(
                    booking.id,
                    booking.total_amount,
                    &payments,
                )),
                Err(e) => {
                    tracing::warn!("Payment lookup failed for booking {}: {}", booking.id, e);
                    None
                }
            };

            let (total_paid, total_due, payment_status, payment_count, last_payment) = match &summary
            {
                Some(s) => (
                    s.total_paid.to_string(),
                    s.total_due.to_string(),
                    s.status.as_str().to_string(),
                    s.payment_count.to_string(),
                    s.last_payment_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                ),
                None => Default::default(),
            };

            writer
                .write_record([
                    booking.id.to_string(),
                    property_name,
                    booking.guest_name.clone(),
                    booking.guest_phone.clone().unwrap_or_default(),
                    booking.check_in.to_string(),
                    booking.check_out.to_string(),
                    booking.nights().to_string(),
                    booking.status.as_str().to_string(),
                    booking.currency.clone(),
                    booking.total_amount.to_string(),
                    total_paid,
                    total_due,
                    payment_status,
                    payment_count,
                    last_payment,
                    booking.created_at.to_rfc3339(),
                ])
                .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))
    }

    async fn visible_properties(&self, actor: &User) -> Result<Vec<Property>> {
        match actor.role {
            UserRole::Admin => self.properties.list(AGGREGATE_PAGE, 0).await,
            UserRole::Owner => self.properties.list_by_owner(actor.id).await,
            UserRole::Agent => {
                let mut properties = Vec::with_capacity(actor.managed_properties.len());
                for property_id in &actor.managed_properties {
                    if let Some(property) = self.properties.find_by_id(*property_id).await? {
                        properties.push(property);
                    }
                }
                Ok(properties)
            }
            UserRole::Guest => Ok(Vec::new()),
        }
    }
}
