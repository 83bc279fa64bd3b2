use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::InviteCode,
    error::{AppError, Result},
    repository::InviteCodeRepository,
};

#[derive(FromRow)]
struct InviteCodeRow {
    id: String,
    code: String,
    property_id: String,
    created_by: String,
    expires_at: Option<NaiveDateTime>,
    max_uses: i64,
    use_count: i64,
    active: bool,
    created_at: NaiveDateTime,
}

pub struct SqliteInviteCodeRepository {
    pool: SqlitePool,
}

impl SqliteInviteCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_invite(row: InviteCodeRow) -> Result<InviteCode> {
        Ok(InviteCode {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            code: row.code,
            property_id: Uuid::parse_str(&row.property_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            created_by: Uuid::parse_str(&row.created_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            expires_at: row
                .expires_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            max_uses: row.max_uses,
            use_count: row.use_count,
            active: row.active,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl InviteCodeRepository for SqliteInviteCodeRepository {
    async fn create(&self, invite: InviteCode) -> Result<InviteCode> {
        let id_str = invite.id.to_string();
        let property_id_str = invite.property_id.to_string();
        let created_by_str = invite.created_by.to_string();
        let expires_at_naive = invite.expires_at.map(|dt| dt.naive_utc());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO invite_codes (
                id, code, property_id, created_by, expires_at,
                max_uses, use_count, active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&invite.code)
        .bind(&property_id_str)
        .bind(&created_by_str)
        .bind(expires_at_naive)
        .bind(invite.max_uses)
        .bind(invite.use_count)
        .bind(invite.active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_code(&invite.code)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created invite code".to_string()))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<InviteCode>> {
        let row = sqlx::query_as::<_, InviteCodeRow>(
            r#"
            SELECT id, code, property_id, created_by, expires_at,
                   max_uses, use_count, active, created_at
            FROM invite_codes
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_invite(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_property(&self, property_id: Uuid) -> Result<Vec<InviteCode>> {
        let property_id_str = property_id.to_string();
        let rows = sqlx::query_as::<_, InviteCodeRow>(
            r#"
            SELECT id, code, property_id, created_by, expires_at,
                   max_uses, use_count, active, created_at
            FROM invite_codes
            WHERE property_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(property_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_invite).collect()
    }

    async fn list_created_by(&self, user_id: Uuid) -> Result<Vec<InviteCode>> {
        let user_id_str = user_id.to_string();
        let rows = sqlx::query_as::<_, InviteCodeRow>(
            r#"
            SELECT id, code, property_id, created_by, expires_at,
                   max_uses, use_count, active, created_at
            FROM invite_codes
            WHERE created_by = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_invite).collect()
    }

    async fn increment_use(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let result = sqlx::query("UPDATE invite_codes SET use_count = use_count + 1 WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invite code not found".to_string()));
        }
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let result = sqlx::query("UPDATE invite_codes SET active = 0 WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invite code not found".to_string()));
        }
        Ok(())
    }
}
