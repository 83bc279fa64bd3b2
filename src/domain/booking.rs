use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_name: String,
    pub guest_phone: Option<String>,
    /// Calendar dates, UTC-anchored. Time of day lives in the minute fields
    /// and only matters for same-day turnover.
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Check-in clock time as minutes from midnight, when the stay deviates
    /// from the standard 14:00.
    pub check_in_minute: Option<i32>,
    /// Checkout clock time as minutes from midnight, when the stay deviates
    /// from the standard 11:00.
    pub check_out_minute: Option<i32>,
    /// Nightly price in minor currency units.
    pub nightly_price: i64,
    pub total_amount: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub created_by: Uuid,
    pub invite_code: Option<String>,
    pub commission: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whole-day stay length. Time of day never changes the night count.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum BookingStatus {
    PendingConfirmation,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingConfirmation => "pending_confirmation",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending_confirmation" => Some(BookingStatus::PendingConfirmation),
            "confirmed" => Some(BookingStatus::Confirmed),
            "checked_in" => Some(BookingStatus::CheckedIn),
            "checked_out" => Some(BookingStatus::CheckedOut),
            "cancelled" => Some(BookingStatus::Cancelled),
            "no_show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// Whether a booking in this status still holds its nights against
    /// availability. A checked-out stay keeps its (past) dates occupied;
    /// cancellations and no-shows free them.
    pub fn occupies_dates(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::NoShow)
    }

    /// Whether no further occupancy changes are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::NoShow | BookingStatus::CheckedOut
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub guest_name: String,
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub check_in_minute: Option<i32>,
    pub check_out_minute: Option<i32>,
    /// Overrides nightly_price x nights when set.
    pub total_amount: Option<i64>,
    pub invite_code: Option<String>,
    pub commission: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBookingRequest {
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub check_in_minute: Option<i32>,
    pub check_out_minute: Option<i32>,
    pub total_amount: Option<i64>,
    pub commission: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(BookingStatus::CheckedIn.as_str(), "checked_in");
        assert_eq!(BookingStatus::from_str("no_show"), Some(BookingStatus::NoShow));
        assert_eq!(BookingStatus::from_str("CONFIRMED"), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::from_str("settled"), None);
    }

    #[test]
    fn test_occupies_dates() {
        assert!(BookingStatus::PendingConfirmation.occupies_dates());
        assert!(BookingStatus::Confirmed.occupies_dates());
        assert!(BookingStatus::CheckedIn.occupies_dates());
        assert!(BookingStatus::CheckedOut.occupies_dates());
        assert!(!BookingStatus::Cancelled.occupies_dates());
        assert!(!BookingStatus::NoShow.occupies_dates());
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
        assert!(BookingStatus::CheckedOut.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::CheckedIn.is_terminal());
    }
}
