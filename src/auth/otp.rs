use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// One-time codes, stored hashed. A phone has at most one live code: issuing
/// a new one retires anything outstanding.
pub struct OtpStore {
    pool: SqlitePool,
}

impl OtpStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issues a fresh 6-digit code and returns the plaintext for delivery.
    pub async fn issue(&self, phone: &str, expiry_minutes: i64) -> Result<String> {
        let code = generate_code();
        let id = Uuid::new_v4().to_string();
        let code_hash = hash_code(&code);
        let now = Utc::now();
        let now_naive = now.naive_utc();
        let expires_at_naive = (now + Duration::minutes(expiry_minutes)).naive_utc();

        sqlx::query("UPDATE otp_codes SET used = 1 WHERE phone = ? AND used = 0")
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO otp_codes (id, phone, code_hash, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(phone)
        .bind(&code_hash)
        .bind(expires_at_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(code)
    }

    /// Checks a submitted code and burns it on success.
    pub async fn verify(&self, phone: &str, code: &str) -> Result<bool> {
        let code_hash = hash_code(code);
        let now_naive = Utc::now().naive_utc();

        let id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM otp_codes
            WHERE phone = ? AND code_hash = ? AND used = 0 AND expires_at > ?
            "#,
        )
        .bind(phone)
        .bind(&code_hash)
        .bind(now_naive)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match id {
            Some(id) => {
                sqlx::query("UPDATE otp_codes SET used = 1 WHERE id = ?")
                    .bind(&id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now_naive = Utc::now().naive_utc();
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= ? OR used = 1")
            .bind(now_naive)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

fn generate_code() -> String {
    use rand::Rng;
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

fn hash_code(code: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}
