use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, Notification, NotificationKind, Property};
use crate::repository::NotificationRepository;

/// A queued notification: one message fanned out to a set of recipients.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub recipients: Vec<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub booking_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
}

/// Hands notification events to a dedicated worker over a bounded channel.
///
/// Dispatch never blocks and never fails the caller: a full queue drops the
/// event with a warning. Request handlers stay on the fast path while the
/// worker persists the feed entries.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl Notifier {
    pub fn start(
        capacity: usize,
        repository: Arc<dyn NotificationRepository>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(run_worker(rx, repository));
        (Self { tx }, handle)
    }

    pub fn dispatch(&self, event: NotificationEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::warn!("Notification queue full, dropping event: {}", e);
        }
    }

    pub fn booking_created(&self, recipients: Vec<Uuid>, booking: &Booking, property: &Property) {
        self.dispatch(NotificationEvent {
            recipients,
            kind: NotificationKind::BookingCreated,
            message: format!(
                "New booking for {} at {} ({} to {})",
                booking.guest_name, property.name, booking.check_in, booking.check_out
            ),
            booking_id: Some(booking.id),
            property_id: Some(property.id),
        });
    }

    pub fn booking_status_changed(
        &self,
        recipients: Vec<Uuid>,
        booking: &Booking,
        property: &Property,
        new_status: BookingStatus,
    ) {
        let (kind, message) = match new_status {
            BookingStatus::Cancelled => (
                NotificationKind::BookingCancelled,
                format!(
                    "Booking for {} at {} was cancelled",
                    booking.guest_name, property.name
                ),
            ),
            _ => (
                NotificationKind::BookingStatusChanged,
                format!(
                    "Booking for {} at {} is now {}",
                    booking.guest_name,
                    property.name,
                    new_status.as_str()
                ),
            ),
        };
        self.dispatch(NotificationEvent {
            recipients,
            kind,
            message,
            booking_id: Some(booking.id),
            property_id: Some(property.id),
        });
    }

    pub fn payment_received(
        &self,
        recipients: Vec<Uuid>,
        booking: &Booking,
        property: &Property,
        amount: i64,
    ) {
        self.dispatch(NotificationEvent {
            recipients,
            kind: NotificationKind::PaymentReceived,
            message: format!(
                "Payment of {} received for {}'s stay at {}",
                format_amount(amount, &booking.currency),
                booking.guest_name,
                property.name
            ),
            booking_id: Some(booking.id),
            property_id: Some(property.id),
        });
    }

    pub fn payment_completed(&self, recipients: Vec<Uuid>, booking: &Booking, property: &Property) {
        self.dispatch(NotificationEvent {
            recipients,
            kind: NotificationKind::PaymentCompleted,
            message: format!(
                "Booking for {} at {} is fully paid",
                booking.guest_name, property.name
            ),
            booking_id: Some(booking.id),
            property_id: Some(property.id),
        });
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<NotificationEvent>,
    repository: Arc<dyn NotificationRepository>,
) {
    while let Some(event) = rx.recv().await {
        for user_id in &event.recipients {
            let notification = Notification {
                id: Uuid::new_v4(),
                user_id: *user_id,
                kind: event.kind,
                message: event.message.clone(),
                booking_id: event.booking_id,
                property_id: event.property_id,
                read: false,
                created_at: Utc::now(),
            };
            match repository.create(notification).await {
                Ok(_) => {
                    tracing::debug!("Stored {} notification for {}", event.kind.as_str(), user_id);
                }
                Err(e) => {
                    // Keep delivering to the remaining recipients even if one fails.
                    tracing::error!("Failed to store notification for {}: {}", user_id, e);
                }
            }
        }
    }
}

fn format_amount(amount: i64, currency: &str) -> String {
    format!("{} {}.{:02}", currency, amount / 100, amount % 100)
}

/// Who hears about a booking event: the owner, and the booking's creator
/// when someone else triggered the change. The actor never notifies itself.
pub fn notify_targets(owner_id: Uuid, created_by: Uuid, actor_id: Uuid) -> Vec<Uuid> {
    let mut targets = Vec::new();
    if owner_id != actor_id {
        targets.push(owner_id);
    }
    if created_by != actor_id && created_by != owner_id {
        targets.push(created_by);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_targets_skips_actor() {
        let owner = Uuid::new_v4();
        let agent = Uuid::new_v4();

        // Agent acts: owner hears about it.
        assert_eq!(notify_targets(owner, agent, agent), vec![owner]);
        // Owner acts on an agent's booking: agent hears about it.
        assert_eq!(notify_targets(owner, agent, owner), vec![agent]);
        // Owner acts on their own booking: nobody to tell.
        assert!(notify_targets(owner, owner, owner).is_empty());
    }

    #[test]
    fn test_notify_targets_deduplicates_owner_creator() {
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();
        // Owner created the booking, admin changes it: owner appears once.
        assert_eq!(notify_targets(owner, owner, admin), vec![owner]);
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(format_amount(20000, "INR"), "INR 200.00");
        assert_eq!(format_amount(12345, "INR"), "INR 123.45");
        assert_eq!(format_amount(5, "USD"), "USD 0.05");
    }
}
