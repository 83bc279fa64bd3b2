use chrono::{Duration, NaiveDate};

use super::Booking;

/// Standard check-in time when a stay does not carry its own: 14:00.
pub const DEFAULT_CHECK_IN_MINUTE: i32 = 14 * 60;
/// Standard checkout time when a stay does not carry its own: 11:00.
pub const DEFAULT_CHECK_OUT_MINUTE: i32 = 11 * 60;

/// Half-open date-range overlap. Symmetric: the checkout day itself is free
/// past the checkout instant, so ranges that merely touch do not overlap.
pub fn ranges_overlap(
    a_check_in: NaiveDate,
    a_check_out: NaiveDate,
    b_check_in: NaiveDate,
    b_check_out: NaiveDate,
) -> bool {
    a_check_in < b_check_out && a_check_out > b_check_in
}

/// The stretch of calendar a stay occupies, with clock times resolved
/// against the standard defaults.
///
/// Callers validate check_in < check_out before building a window; the
/// conflict logic assumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayWindow {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub check_in_minute: i32,
    pub check_out_minute: i32,
}

impl StayWindow {
    pub fn new(
        check_in: NaiveDate,
        check_out: NaiveDate,
        check_in_minute: Option<i32>,
        check_out_minute: Option<i32>,
    ) -> Self {
        Self {
            check_in,
            check_out,
            check_in_minute: check_in_minute.unwrap_or(DEFAULT_CHECK_IN_MINUTE),
            check_out_minute: check_out_minute.unwrap_or(DEFAULT_CHECK_OUT_MINUTE),
        }
    }

    /// Whether this candidate stay collides with an existing one.
    ///
    /// Sharing any full night is always a conflict. When the ranges only
    /// touch at a boundary date it is same-day turnover, decided by clock
    /// time: arriving before the previous guest has vacated, or departing
    /// after the next guest has arrived, conflicts.
    pub fn conflicts_with(&self, existing: &StayWindow) -> bool {
        if ranges_overlap(
            self.check_in,
            self.check_out,
            existing.check_in,
            existing.check_out,
        ) {
            return true;
        }
        if self.check_in == existing.check_out {
            return self.check_in_minute < existing.check_out_minute;
        }
        if self.check_out == existing.check_in {
            return self.check_out_minute > existing.check_in_minute;
        }
        false
    }
}

impl From<&Booking> for StayWindow {
    fn from(booking: &Booking) -> Self {
        StayWindow::new(
            booking.check_in,
            booking.check_out,
            booking.check_in_minute,
            booking.check_out_minute,
        )
    }
}

/// True when the candidate collides with none of the existing windows.
pub fn is_window_available(candidate: &StayWindow, existing: &[StayWindow]) -> bool {
    existing.iter().all(|w| !candidate.conflicts_with(w))
}

/// The date span of bookings worth fetching for a conflict check: padded
/// far enough back that a long stay starting before the candidate range is
/// still seen, and one day forward to catch turnover on the checkout date.
pub fn scan_window(
    check_in: NaiveDate,
    check_out: NaiveDate,
    lookback_days: i64,
) -> (NaiveDate, NaiveDate) {
    (
        check_in - Duration::days(lookback_days),
        check_out + Duration::days(1),
    )
}
