use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub booking_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum NotificationKind {
    BookingCreated,
    BookingCancelled,
    BookingStatusChanged,
    PaymentReceived,
    PaymentCompleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::BookingStatusChanged => "booking_status_changed",
            NotificationKind::PaymentReceived => "payment_received",
            NotificationKind::PaymentCompleted => "payment_completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "booking_created" => Some(NotificationKind::BookingCreated),
            "booking_cancelled" => Some(NotificationKind::BookingCancelled),
            "booking_status_changed" => Some(NotificationKind::BookingStatusChanged),
            "payment_received" => Some(NotificationKind::PaymentReceived),
            "payment_completed" => Some(NotificationKind::PaymentCompleted),
            _ => None,
        }
    }
}
