use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Property, UpdatePropertyRequest},
    error::{AppError, Result},
    repository::PropertyRepository,
};

#[derive(FromRow)]
struct PropertyRow {
    id: String,
    name: String,
    address: Option<String>,
    owner_id: String,
    nightly_price: i64,
    currency: String,
    bedrooms: i32,
    max_guests: i32,
    active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_property(row: PropertyRow) -> Result<Property> {
        Ok(Property {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            address: row.address,
            owner_id: Uuid::parse_str(&row.owner_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            nightly_price: row.nightly_price,
            currency: row.currency,
            bedrooms: row.bedrooms,
            max_guests: row.max_guests,
            active: row.active,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn create(&self, property: Property) -> Result<Property> {
        let id_str = property.id.to_string();
        let owner_id_str = property.owner_id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO properties (
                id, name, address, owner_id, nightly_price, currency,
                bedrooms, max_guests, active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&property.name)
        .bind(&property.address)
        .bind(&owner_id_str)
        .bind(property.nightly_price)
        .bind(&property.currency)
        .bind(property.bedrooms)
        .bind(property.max_guests)
        .bind(property.active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(property.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created property".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, address, owner_id, nightly_price, currency,
                   bedrooms, max_guests, active, created_at, updated_at
            FROM properties
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_property(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, address, owner_id, nightly_price, currency,
                   bedrooms, max_guests, active, created_at, updated_at
            FROM properties
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_property).collect()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        let owner_id_str = owner_id.to_string();
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, name, address, owner_id, nightly_price, currency,
                   bedrooms, max_guests, active, created_at, updated_at
            FROM properties
            WHERE owner_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_property).collect()
    }

    async fn update(&self, id: Uuid, update: UpdatePropertyRequest) -> Result<Property> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        let active = update.active.unwrap_or(existing.active);

        let id_str = id.to_string();
        let now_naive = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE properties
            SET name = COALESCE(?, name),
                address = COALESCE(?, address),
                nightly_price = COALESCE(?, nightly_price),
                currency = COALESCE(?, currency),
                bedrooms = COALESCE(?, bedrooms),
                max_guests = COALESCE(?, max_guests),
                active = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.address)
        .bind(update.nightly_price)
        .bind(&update.currency)
        .bind(update.bedrooms)
        .bind(update.max_guests)
        .bind(active)
        .bind(now_naive)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated property".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM managed_properties WHERE property_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM invite_codes WHERE property_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Property not found".to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
