use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentMethod},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    booking_id: String,
    amount: i64,
    currency: String,
    method: String,
    reference: Option<String>,
    recorded_by: String,
    paid_on: NaiveDate,
    notes: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount: row.amount,
            currency: row.currency,
            method: PaymentMethod::from_str(&row.method).ok_or_else(|| {
                AppError::Database(format!("Invalid payment method: {}", row.method))
            })?,
            reference: row.reference,
            recorded_by: Uuid::parse_str(&row.recorded_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            paid_on: row.paid_on,
            notes: row.notes,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let id_str = payment.id.to_string();
        let booking_id_str = payment.booking_id.to_string();
        let recorded_by_str = payment.recorded_by.to_string();
        let method_str = payment.method.as_str();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, amount, currency, method,
                reference, recorded_by, paid_on, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&booking_id_str)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(method_str)
        .bind(&payment.reference)
        .bind(&recorded_by_str)
        .bind(payment.paid_on)
        .bind(&payment.notes)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(payment.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payment".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, amount, currency, method,
                   reference, recorded_by, paid_on, notes, created_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        let booking_id_str = booking_id.to_string();
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, amount, currency, method,
                   reference, recorded_by, paid_on, notes, created_at
            FROM payments
            WHERE booking_id = ?
            ORDER BY paid_on, created_at
            "#,
        )
        .bind(booking_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let result = sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Payment not found".to_string()));
        }
        Ok(())
    }
}
