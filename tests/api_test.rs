use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use veranda::{
    api,
    auth::AuthService,
    config::Settings,
    domain::{CreateUserRequest, User, UserRole},
    repository::UserRepository,
    service::ServiceContext,
};

async fn setup() -> anyhow::Result<(Router, Arc<ServiceContext>)> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let settings = Settings::default();
    let (ctx, _worker) = ServiceContext::new(pool, &settings);
    let ctx = Arc::new(ctx);
    let app = api::create_app(ctx.clone(), Arc::new(settings));
    Ok((app, ctx))
}

async fn make_user(
    ctx: &ServiceContext,
    phone: &str,
    role: UserRole,
    password: Option<&str>,
) -> anyhow::Result<User> {
    let hash = match password {
        Some(p) => Some(AuthService::hash_password(p).await?),
        None => None,
    };
    Ok(ctx
        .user_repo
        .create(
            CreateUserRequest {
                phone: phone.to_string(),
                name: "Test User".to_string(),
                role,
                password: None,
            },
            hash,
        )
        .await?)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_and_root() -> anyhow::Result<()> {
    let (app, _) = setup().await?;

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");

    let response = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["name"], "Veranda API");

    Ok(())
}

#[tokio::test]
async fn test_protected_routes_require_token() -> anyhow::Result<()> {
    let (app, _) = setup().await?;

    let response = app.clone().oneshot(get("/api/bookings", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get("/api/bookings", Some("not-a-real-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_booking_workflow_over_http() -> anyhow::Result<()> {
    let (app, ctx) = setup().await?;
    make_user(&ctx, "9800000001", UserRole::Admin, Some("admin123")).await?;

    // Login for a bearer token
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            None,
            json!({"phone": "9800000001", "password": "admin123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["user"]["role"], "Admin");
    let token = body["token"].as_str().unwrap().to_string();
    let token = Some(token.as_str());

    // Create a property
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/properties",
            token,
            json!({"name": "Hillside Villa", "nightly_price": 450_000}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let property = body_json(response).await?;
    let property_id = property["id"].as_str().unwrap().to_string();

    // The window is free before anyone books it
    let uri = format!(
        "/api/properties/{}/availability?check_in=2026-03-10&check_out=2026-03-13",
        property_id
    );
    let response = app.clone().oneshot(get(&uri, token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["available"], true);

    // Book it
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            token,
            json!({
                "property_id": property_id,
                "guest_name": "Meera Pillai",
                "check_in": "2026-03-10",
                "check_out": "2026-03-13"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = body_json(response).await?;
    assert_eq!(booking["nights"], 3);
    assert_eq!(booking["total_amount"], 1_350_000);
    assert_eq!(booking["status"], "PendingConfirmation");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // Overlapping dates are refused
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            token,
            json!({
                "property_id": property_id,
                "guest_name": "Arjun Das",
                "check_in": "2026-03-11",
                "check_out": "2026-03-14"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // And the availability endpoint agrees
    let uri = format!(
        "/api/properties/{}/availability?check_in=2026-03-11&check_out=2026-03-14",
        property_id
    );
    let response = app.clone().oneshot(get(&uri, token)).await.unwrap();
    let body = body_json(response).await?;
    assert_eq!(body["available"], false);

    // Settle the bill
    let uri = format!("/api/bookings/{}/payment-status", booking_id);
    let response = app.clone().oneshot(get(&uri, token)).await.unwrap();
    let body = body_json(response).await?;
    assert_eq!(body["status"], "Pending");

    let uri = format!("/api/bookings/{}/payments", booking_id);
    let response = app
        .clone()
        .oneshot(post_json(
            &uri,
            token,
            json!({"amount": 1_350_000, "method": "Cash", "paid_on": "2026-03-10"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await?;
    assert_eq!(body["summary"]["status"], "Completed");

    // History bundles the booking with its payment trail
    let uri = format!("/api/bookings/{}/history", booking_id);
    let response = app.clone().oneshot(get(&uri, token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["booking"]["guest_name"], "Meera Pillai");
    assert_eq!(body["payments"].as_array().map(|p| p.len()), Some(1));
    assert_eq!(body["summary"]["total_due"], 0);

    // Dashboard and export reflect the booking
    let response = app
        .clone()
        .oneshot(get("/api/analytics/dashboard", token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["total_bookings"], 1);

    let response = app
        .oneshot(get("/api/analytics/export", token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let csv = String::from_utf8(bytes.to_vec())?;
    assert!(csv.starts_with("booking_id,"));
    assert!(csv.contains("Meera Pillai"));

    Ok(())
}

#[tokio::test]
async fn test_export_is_admin_only() -> anyhow::Result<()> {
    let (app, ctx) = setup().await?;
    let owner = make_user(&ctx, "9800000010", UserRole::Owner, None).await?;
    let token = ctx.auth_service.issue_token(&owner)?;

    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["phone"], "9800000010");

    // A refreshed token is good for the same account
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/refresh", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    let refreshed = body["token"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&refreshed)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/analytics/export", Some(&refreshed)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}
