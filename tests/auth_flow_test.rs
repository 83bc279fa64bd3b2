use std::sync::Arc;

use sqlx::SqlitePool;

use veranda::{
    auth::AuthService,
    config::AuthConfig,
    domain::{CreateUserRequest, UserRole},
    error::AppError,
    repository::{SqliteUserRepository, UserRepository},
};

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        token_duration_hours: 1,
        otp_expiry_minutes: 5,
        dev_mode: true,
    }
}

async fn setup() -> anyhow::Result<(AuthService, Arc<SqliteUserRepository>)> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let auth = AuthService::new(pool, users.clone(), test_config());
    Ok((auth, users))
}

#[tokio::test]
async fn test_otp_flow_creates_guest() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    // Formatting noise in the phone number is stripped on the way in
    let challenge = auth.request_otp("98 7654-3210").await?;
    assert_eq!(challenge.phone, "9876543210");
    assert_eq!(challenge.expires_in_minutes, 5);
    let code = challenge.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;
    assert_eq!(code.len(), 6);

    let (user, token) = auth
        .verify_otp("9876543210", &code, Some("Anita Kurian".to_string()))
        .await?;
    assert_eq!(user.phone, "9876543210");
    assert_eq!(user.name, "Anita Kurian");
    assert_eq!(user.role, UserRole::Guest);

    let claims = auth.verify_token(&token)?;
    assert_eq!(claims.user_id()?, user.id);
    assert_eq!(claims.user_role()?, UserRole::Guest);

    Ok(())
}

#[tokio::test]
async fn test_otp_is_single_use() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    let challenge = auth.request_otp("9876543210").await?;
    let code = challenge.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;

    auth.verify_otp("9876543210", &code, None).await?;

    let replay = auth.verify_otp("9876543210", &code, None).await;
    assert!(matches!(replay, Err(AppError::Unauthorized)));

    Ok(())
}

#[tokio::test]
async fn test_otp_rejects_wrong_code() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    let challenge = auth.request_otp("9876543210").await?;
    let code = challenge.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let rejected = auth.verify_otp("9876543210", wrong, None).await;
    assert!(matches!(rejected, Err(AppError::Unauthorized)));

    // The right code still works afterwards
    auth.verify_otp("9876543210", &code, None).await?;

    Ok(())
}

#[tokio::test]
async fn test_reissue_retires_older_code() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    let first = auth.request_otp("9876543210").await?;
    let first_code = first.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;
    let second = auth.request_otp("9876543210").await?;
    let second_code = second.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;

    if first_code != second_code {
        let stale = auth.verify_otp("9876543210", &first_code, None).await;
        assert!(matches!(stale, Err(AppError::Unauthorized)));
    }
    auth.verify_otp("9876543210", &second_code, None).await?;

    Ok(())
}

#[tokio::test]
async fn test_otp_keeps_existing_account() -> anyhow::Result<()> {
    let (auth, users) = setup().await?;

    let owner = users
        .create(
            CreateUserRequest {
                phone: "9876543210".to_string(),
                name: "Priya Nair".to_string(),
                role: UserRole::Owner,
                password: None,
            },
            None,
        )
        .await?;

    let challenge = auth.request_otp("9876543210").await?;
    let code = challenge.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;

    // A passed name must not rename or demote the existing account
    let (user, _) = auth
        .verify_otp("9876543210", &code, Some("Someone Else".to_string()))
        .await?;
    assert_eq!(user.id, owner.id);
    assert_eq!(user.name, "Priya Nair");
    assert_eq!(user.role, UserRole::Owner);

    Ok(())
}

#[tokio::test]
async fn test_invalid_phone_rejected() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    let too_short = auth.request_otp("12345").await;
    assert!(matches!(too_short, Err(AppError::Validation(_))));

    let letters = auth.request_otp("98765abcde").await;
    assert!(matches!(letters, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_password_login() -> anyhow::Result<()> {
    let (auth, users) = setup().await?;

    let hash = AuthService::hash_password("correct horse").await?;
    let admin = users
        .create(
            CreateUserRequest {
                phone: "9800000001".to_string(),
                name: "Admin".to_string(),
                role: UserRole::Admin,
                password: None,
            },
            Some(hash),
        )
        .await?;

    let (user, token) = auth.login("9800000001", "correct horse").await?;
    assert_eq!(user.id, admin.id);
    let claims = auth.verify_token(&token)?;
    assert_eq!(claims.user_role()?, UserRole::Admin);

    let wrong = auth.login("9800000001", "battery staple").await;
    assert!(matches!(wrong, Err(AppError::Unauthorized)));

    // Accounts without a password cannot log in this way
    users
        .create(
            CreateUserRequest {
                phone: "9800000002".to_string(),
                name: "Guest".to_string(),
                role: UserRole::Guest,
                password: None,
            },
            None,
        )
        .await?;
    let no_password = auth.login("9800000002", "anything").await;
    assert!(matches!(no_password, Err(AppError::Unauthorized)));

    Ok(())
}

#[tokio::test]
async fn test_password_hash_round_trip() -> anyhow::Result<()> {
    let hash = AuthService::hash_password("secret123").await?;
    assert_ne!(hash, "secret123");
    assert!(AuthService::verify_password("secret123", &hash).await?);
    assert!(!AuthService::verify_password("secret124", &hash).await?);
    Ok(())
}

#[tokio::test]
async fn test_tampered_token_rejected() -> anyhow::Result<()> {
    let (auth, users) = setup().await?;

    let user = users
        .create(
            CreateUserRequest {
                phone: "9800000003".to_string(),
                name: "Rahul".to_string(),
                role: UserRole::Agent,
                password: None,
            },
            None,
        )
        .await?;
    let token = auth.issue_token(&user)?;
    auth.verify_token(&token)?;

    let mut tampered = token.clone();
    tampered.push('x');
    assert!(matches!(auth.verify_token(&tampered), Err(AppError::Unauthorized)));

    let other_secret = AuthService::new(
        SqlitePool::connect(":memory:").await?,
        users.clone(),
        AuthConfig {
            jwt_secret: "different-secret".to_string(),
            ..test_config()
        },
    );
    assert!(matches!(other_secret.verify_token(&token), Err(AppError::Unauthorized)));

    Ok(())
}

#[tokio::test]
async fn test_cleanup_sweeps_burned_codes() -> anyhow::Result<()> {
    let (auth, _) = setup().await?;

    let challenge = auth.request_otp("9876543210").await?;
    let code = challenge.dev_code.ok_or_else(|| anyhow::anyhow!("dev mode returns the code"))?;
    auth.verify_otp("9876543210", &code, None).await?;

    // A live code for another phone survives the sweep
    auth.request_otp("9822334455").await?;

    let removed = auth.cleanup_expired_otps().await?;
    assert_eq!(removed, 1);

    let second = auth.cleanup_expired_otps().await?;
    assert_eq!(second, 0);

    Ok(())
}
