use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    domain::{normalize_phone, CreateUserRequest, User, UserRole},
    error::{AppError, Result},
    repository::UserRepository,
};

pub mod otp;
pub mod token;

use otp::OtpStore;
pub use token::Claims;

#[derive(Debug, Serialize)]
pub struct OtpChallenge {
    pub phone: String,
    pub expires_in_minutes: i64,
    /// Populated only in dev mode, where no SMS goes out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_code: Option<String>,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    otp_store: OtpStore,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(pool: SqlitePool, users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self {
            users,
            otp_store: OtpStore::new(pool),
            config,
        }
    }

    pub async fn request_otp(&self, phone: &str) -> Result<OtpChallenge> {
        let phone = normalize_phone(phone)
            .ok_or_else(|| AppError::Validation("Invalid phone number".to_string()))?;

        let code = self
            .otp_store
            .issue(&phone, self.config.otp_expiry_minutes)
            .await?;

        let dev_code = if self.config.dev_mode {
            tracing::info!("Dev mode OTP for {}: {}", phone, code);
            Some(code)
        } else {
            // SMS dispatch is handled outside this service.
            tracing::info!("Issued OTP for {}", phone);
            None
        };

        Ok(OtpChallenge {
            phone,
            expires_in_minutes: self.config.otp_expiry_minutes,
            dev_code,
        })
    }

    /// Verifies the code, creating a guest account on first contact, and
    /// returns the user with a signed bearer token.
    pub async fn verify_otp(
        &self,
        phone: &str,
        code: &str,
        name: Option<String>,
    ) -> Result<(User, String)> {
        let phone = normalize_phone(phone)
            .ok_or_else(|| AppError::Validation("Invalid phone number".to_string()))?;

        if !self.otp_store.verify(&phone, code).await? {
            return Err(AppError::Unauthorized);
        }

        let user = match self.users.find_by_phone(&phone).await? {
            Some(user) => user,
            None => {
                self.users
                    .create(
                        CreateUserRequest {
                            phone: phone.clone(),
                            name: name.unwrap_or_else(|| "Guest".to_string()),
                            role: UserRole::Guest,
                            password: None,
                        },
                        None,
                    )
                    .await?
            }
        };

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, phone: &str, password: &str) -> Result<(User, String)> {
        let phone = normalize_phone(phone)
            .ok_or_else(|| AppError::Validation("Invalid phone number".to_string()))?;

        let hash = self
            .users
            .password_hash(&phone)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !Self::verify_password(password, &hash).await? {
            return Err(AppError::Unauthorized);
        }

        let user = self
            .users
            .find_by_phone(&phone)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        token::issue_token(
            &self.config.jwt_secret,
            user.id,
            &user.phone,
            user.role,
            self.config.token_duration_hours,
        )
    }

    pub fn verify_token(&self, bearer: &str) -> Result<Claims> {
        token::verify_token(&self.config.jwt_secret, bearer)
    }

    pub async fn cleanup_expired_otps(&self) -> Result<u64> {
        self.otp_store.cleanup_expired().await
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }
}
