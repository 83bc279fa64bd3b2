use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    /// Free-form transaction reference (UPI id, cheque number).
    pub reference: Option<String>,
    pub recorded_by: Uuid,
    /// The day the money changed hands, distinct from when the record was
    /// entered.
    pub paid_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentMethod {
    Cash,
    MobileTransfer,
    BankTransfer,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileTransfer => "mobile_transfer",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "mobile_transfer" => Some(PaymentMethod::MobileTransfer),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "cheque" => Some(PaymentMethod::Cheque),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// Derived payment classification for a booking. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Due,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Due => "due",
            PaymentStatus::Completed => "completed",
        }
    }
}

/// Where a booking stands against its payment history. Recomputed from the
/// live payment set on every query so it can never go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub booking_id: Uuid,
    pub total_amount: i64,
    pub total_paid: i64,
    pub total_due: i64,
    pub status: PaymentStatus,
    pub payment_count: usize,
    pub last_payment_date: Option<NaiveDate>,
}

impl PaymentSummary {
    /// Pure derivation: same booking total and payment set, same summary.
    ///
    /// Overpayment is not an error; the due amount clamps to zero and the
    /// booking reads as completed.
    pub fn derive(booking_id: Uuid, total_amount: i64, payments: &[Payment]) -> Self {
        let total_paid: i64 = payments.iter().map(|p| p.amount).sum();
        let last_payment_date = payments.iter().map(|p| p.paid_on).max();

        let status = if payments.is_empty() {
            PaymentStatus::Pending
        } else if total_paid >= total_amount {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Due
        };

        Self {
            booking_id,
            total_amount,
            total_paid,
            total_due: (total_amount - total_paid).max(0),
            status,
            payment_count: payments.len(),
            last_payment_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub amount: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_on: NaiveDate,
    pub notes: Option<String>,
}
