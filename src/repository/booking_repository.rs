use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus},
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    property_id: String,
    guest_name: String,
    guest_phone: Option<String>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    check_in_minute: Option<i32>,
    check_out_minute: Option<i32>,
    nightly_price: i64,
    total_amount: i64,
    currency: String,
    status: String,
    created_by: String,
    invite_code: Option<String>,
    commission: Option<i64>,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            property_id: Uuid::parse_str(&row.property_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            guest_name: row.guest_name,
            guest_phone: row.guest_phone,
            check_in: row.check_in,
            check_out: row.check_out,
            check_in_minute: row.check_in_minute,
            check_out_minute: row.check_out_minute,
            nightly_price: row.nightly_price,
            total_amount: row.total_amount,
            currency: row.currency,
            status: BookingStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid booking status: {}", row.status))
            })?,
            created_by: Uuid::parse_str(&row.created_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            invite_code: row.invite_code,
            commission: row.commission,
            notes: row.notes,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    /// Claims one slot row per night in [check_in, check_out). The checkout
    /// night stays free for same-day turnover. A primary-key collision means
    /// another booking already holds a night.
    async fn claim_slots(
        tx: &mut Transaction<'_, Sqlite>,
        property_id: Uuid,
        booking_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<()> {
        let property_id_str = property_id.to_string();
        let booking_id_str = booking_id.to_string();

        let mut night = check_in;
        while night < check_out {
            sqlx::query(
                "INSERT INTO booking_slots (property_id, night, booking_id) VALUES (?, ?, ?)",
            )
            .bind(&property_id_str)
            .bind(night)
            .bind(&booking_id_str)
            .execute(&mut **tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                    format!("Dates are no longer available: {} is already booked", night),
                ),
                _ => AppError::Database(e.to_string()),
            })?;
            night += Duration::days(1);
        }
        Ok(())
    }

    async fn release_slots(tx: &mut Transaction<'_, Sqlite>, booking_id: Uuid) -> Result<()> {
        let booking_id_str = booking_id.to_string();
        sqlx::query("DELETE FROM booking_slots WHERE booking_id = ?")
            .bind(&booking_id_str)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking> {
        let id_str = booking.id.to_string();
        let property_id_str = booking.property_id.to_string();
        let created_by_str = booking.created_by.to_string();
        let status_str = booking.status.as_str();
        let now = Utc::now().naive_utc();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, property_id, guest_name, guest_phone, check_in, check_out,
                check_in_minute, check_out_minute, nightly_price, total_amount,
                currency, status, created_by, invite_code, commission, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&property_id_str)
        .bind(&booking.guest_name)
        .bind(&booking.guest_phone)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.check_in_minute)
        .bind(booking.check_out_minute)
        .bind(booking.nightly_price)
        .bind(booking.total_amount)
        .bind(&booking.currency)
        .bind(status_str)
        .bind(&created_by_str)
        .bind(&booking.invite_code)
        .bind(booking.commission)
        .bind(&booking.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if booking.status.occupies_dates() {
            Self::claim_slots(
                &mut tx,
                booking.property_id,
                booking.id,
                booking.check_in,
                booking.check_out,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(booking.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created booking".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, property_id, guest_name, guest_phone, check_in, check_out,
                   check_in_minute, check_out_minute, nightly_price, total_amount,
                   currency, status, created_by, invite_code, commission, notes,
                   created_at, updated_at
            FROM bookings
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, property_id, guest_name, guest_phone, check_in, check_out,
                   check_in_minute, check_out_minute, nightly_price, total_amount,
                   currency, status, created_by, invite_code, commission, notes,
                   created_at, updated_at
            FROM bookings
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_for_property(
        &self,
        property_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>> {
        let property_id_str = property_id.to_string();
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, property_id, guest_name, guest_phone, check_in, check_out,
                   check_in_minute, check_out_minute, nightly_price, total_amount,
                   currency, status, created_by, invite_code, commission, notes,
                   created_at, updated_at
            FROM bookings
            WHERE property_id = ?
            ORDER BY check_in DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(property_id_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_in_window(
        &self,
        property_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let property_id_str = property_id.to_string();
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, property_id, guest_name, guest_phone, check_in, check_out,
                   check_in_minute, check_out_minute, nightly_price, total_amount,
                   currency, status, created_by, invite_code, commission, notes,
                   created_at, updated_at
            FROM bookings
            WHERE property_id = ? AND check_in >= ? AND check_in <= ?
            ORDER BY check_in
            "#,
        )
        .bind(property_id_str)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_created_by(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, property_id, guest_name, guest_phone, check_in, check_out,
                   check_in_minute, check_out_minute, nightly_price, total_amount,
                   currency, status, created_by, invite_code, commission, notes,
                   created_at, updated_at
            FROM bookings
            WHERE created_by = ?
            ORDER BY check_in DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn update(&self, id: Uuid, booking: Booking) -> Result<Booking> {
        let id_str = id.to_string();
        let status_str = booking.status.as_str();
        let now = Utc::now().naive_utc();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::release_slots(&mut tx, id).await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET guest_name = ?,
                guest_phone = ?,
                check_in = ?,
                check_out = ?,
                check_in_minute = ?,
                check_out_minute = ?,
                nightly_price = ?,
                total_amount = ?,
                currency = ?,
                status = ?,
                commission = ?,
                notes = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&booking.guest_name)
        .bind(&booking.guest_phone)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.check_in_minute)
        .bind(booking.check_out_minute)
        .bind(booking.nightly_price)
        .bind(booking.total_amount)
        .bind(&booking.currency)
        .bind(status_str)
        .bind(booking.commission)
        .bind(&booking.notes)
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        if booking.status.occupies_dates() {
            Self::claim_slots(
                &mut tx,
                booking.property_id,
                id,
                booking.check_in,
                booking.check_out,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated booking".to_string()))
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let id_str = id.to_string();
        let status_str = status.as_str();
        let now = Utc::now().naive_utc();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status_str)
            .bind(now)
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Cancellations free the nights; reviving a cancelled booking has to
        // win them back, and fails with a conflict if someone else got there.
        if existing.status.occupies_dates() && !status.occupies_dates() {
            Self::release_slots(&mut tx, id).await?;
        } else if !existing.status.occupies_dates() && status.occupies_dates() {
            Self::claim_slots(
                &mut tx,
                existing.property_id,
                id,
                existing.check_in,
                existing.check_out,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated booking".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM booking_slots WHERE booking_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM payments WHERE booking_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
