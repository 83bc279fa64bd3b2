use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    notifier::{notify_targets, Notifier},
    repository::{BookingRepository, PaymentRepository, PropertyRepository},
};

pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingRepository>,
    properties: Arc<dyn PropertyRepository>,
    notifier: Notifier,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingRepository>,
        properties: Arc<dyn PropertyRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            payments,
            bookings,
            properties,
            notifier,
        }
    }

    /// Records an offline payment against a booking. The payment currency is
    /// always the booking's currency. Returns the payment together with the
    /// freshly derived summary.
    pub async fn log_payment(
        &self,
        actor: &User,
        request: CreatePaymentRequest,
    ) -> Result<(Payment, PaymentSummary)> {
        if request.amount <= 0 {
            return Err(AppError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let (booking, property) = self.authorized_booking(actor, request.booking_id).await?;

        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            amount: request.amount,
            currency: booking.currency.clone(),
            method: request.method,
            reference: request.reference,
            recorded_by: actor.id,
            paid_on: request.paid_on,
            notes: request.notes,
            created_at: Utc::now(),
        };

        let payment = self.payments.create(payment).await?;

        let all_payments = self.payments.list_for_booking(booking.id).await?;
        let summary = PaymentSummary::derive(booking.id, booking.total_amount, &all_payments);

        let recipients = notify_targets(property.owner_id, booking.created_by, actor.id);
        if summary.status == PaymentStatus::Completed {
            self.notifier
                .payment_completed(recipients, &booking, &property);
        } else {
            self.notifier
                .payment_received(recipients, &booking, &property, payment.amount);
        }

        Ok((payment, summary))
    }

    /// Recomputes the summary from the live payment set. Nothing is cached;
    /// two calls with no intervening writes return the same answer.
    pub async fn payment_status(&self, actor: &User, booking_id: Uuid) -> Result<PaymentSummary> {
        let (booking, _) = self.authorized_booking(actor, booking_id).await?;
        let payments = self.payments.list_for_booking(booking.id).await?;
        Ok(PaymentSummary::derive(
            booking.id,
            booking.total_amount,
            &payments,
        ))
    }

    pub async fn list_for_booking(&self, actor: &User, booking_id: Uuid) -> Result<Vec<Payment>> {
        let (booking, _) = self.authorized_booking(actor, booking_id).await?;
        self.payments.list_for_booking(booking.id).await
    }

    /// Booking, payment trail, and derived summary in one authorized read.
    pub async fn history(
        &self,
        actor: &User,
        booking_id: Uuid,
    ) -> Result<(Booking, Vec<Payment>, PaymentSummary)> {
        let (booking, _) = self.authorized_booking(actor, booking_id).await?;
        let payments = self.payments.list_for_booking(booking.id).await?;
        let summary = PaymentSummary::derive(booking.id, booking.total_amount, &payments);
        Ok((booking, payments, summary))
    }

    /// Payments are immutable once logged; only an admin may remove one.
    pub async fn delete_payment(&self, actor: &User, id: Uuid) -> Result<()> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        let payment = self
            .payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        self.payments.delete(payment.id).await
    }

    async fn authorized_booking(&self, actor: &User, booking_id: Uuid) -> Result<(Booking, Property)> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        let property = self
            .properties
            .find_by_id(booking.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        if booking.created_by != actor.id && !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }
        Ok((booking, property))
    }
}
