use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use veranda::{
    config::Settings,
    domain::{
        Booking, BookingStatus, CreateBookingRequest, CreatePaymentRequest, CreatePropertyRequest,
        CreateUserRequest, NotificationKind, PaymentMethod, PaymentStatus, Property, User,
        UserRole,
    },
    error::AppError,
    repository::{NotificationRepository, SqliteNotificationRepository, UserRepository},
    service::ServiceContext,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup() -> anyhow::Result<(ServiceContext, JoinHandle<()>, SqlitePool)> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let settings = Settings::default();
    let (ctx, worker) = ServiceContext::new(pool.clone(), &settings);
    Ok((ctx, worker, pool))
}

async fn make_user(ctx: &ServiceContext, phone: &str, name: &str, role: UserRole) -> anyhow::Result<User> {
    Ok(ctx
        .user_repo
        .create(
            CreateUserRequest {
                phone: phone.to_string(),
                name: name.to_string(),
                role,
                password: None,
            },
            None,
        )
        .await?)
}

/// Property at 5000 per night plus a four-night March stay, so the booking
/// total lands at a round 20000.
async fn booked_property(
    ctx: &ServiceContext,
    owner: &User,
) -> anyhow::Result<(Property, Booking)> {
    let property = ctx
        .property_service
        .create_property(
            owner,
            CreatePropertyRequest {
                name: "Spice Garden Homestay".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 5_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    let booking = ctx
        .booking_service
        .create_booking(
            owner,
            CreateBookingRequest {
                property_id: property.id,
                guest_name: "Meera Pillai".to_string(),
                guest_phone: None,
                check_in: date(2026, 3, 1),
                check_out: date(2026, 3, 1) + Duration::days(4),
                check_in_minute: None,
                check_out_minute: None,
                total_amount: None,
                invite_code: None,
                commission: None,
                notes: None,
            },
        )
        .await?;
    assert_eq!(booking.total_amount, 20_000);

    Ok((property, booking))
}

fn payment_request(
    booking_id: uuid::Uuid,
    amount: i64,
    method: PaymentMethod,
    paid_on: NaiveDate,
) -> CreatePaymentRequest {
    CreatePaymentRequest {
        booking_id,
        amount,
        method,
        reference: None,
        paid_on,
        notes: None,
    }
}

#[tokio::test]
async fn test_payment_status_over_lifecycle() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9820000001", "Priya", UserRole::Owner).await?;
    let (_, booking) = booked_property(&ctx, &owner).await?;

    // Nothing paid yet
    let summary = ctx.payment_service.payment_status(&owner, booking.id).await?;
    assert_eq!(summary.status, PaymentStatus::Pending);
    assert_eq!(summary.total_due, 20_000);
    assert_eq!(summary.payment_count, 0);
    assert!(summary.last_payment_date.is_none());

    // Half paid
    let (payment, summary) = ctx
        .payment_service
        .log_payment(
            &owner,
            payment_request(booking.id, 10_000, PaymentMethod::MobileTransfer, date(2026, 3, 1)),
        )
        .await?;
    assert_eq!(payment.amount, 10_000);
    assert_eq!(summary.status, PaymentStatus::Due);
    assert_eq!(summary.total_paid, 10_000);
    assert_eq!(summary.total_due, 10_000);
    assert_eq!(summary.payment_count, 1);

    // Settled
    let (_, summary) = ctx
        .payment_service
        .log_payment(
            &owner,
            payment_request(booking.id, 10_000, PaymentMethod::BankTransfer, date(2026, 3, 3)),
        )
        .await?;
    assert_eq!(summary.status, PaymentStatus::Completed);
    assert_eq!(summary.total_due, 0);
    assert_eq!(summary.last_payment_date, Some(date(2026, 3, 3)));

    let payments = ctx.payment_service.list_for_booking(&owner, booking.id).await?;
    assert_eq!(payments.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_payment_validation() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9820000002", "Priya", UserRole::Owner).await?;
    let (_, booking) = booked_property(&ctx, &owner).await?;

    let zero = ctx
        .payment_service
        .log_payment(
            &owner,
            payment_request(booking.id, 0, PaymentMethod::Cash, date(2026, 3, 1)),
        )
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let negative = ctx
        .payment_service
        .log_payment(
            &owner,
            payment_request(booking.id, -500, PaymentMethod::Cash, date(2026, 3, 1)),
        )
        .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_payment_is_admin_only() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let admin = make_user(&ctx, "9820000003", "Admin", UserRole::Admin).await?;
    let owner = make_user(&ctx, "9820000004", "Priya", UserRole::Owner).await?;
    let (_, booking) = booked_property(&ctx, &owner).await?;

    let (payment, summary) = ctx
        .payment_service
        .log_payment(
            &owner,
            payment_request(booking.id, 20_000, PaymentMethod::Cash, date(2026, 3, 2)),
        )
        .await?;
    assert_eq!(summary.status, PaymentStatus::Completed);

    let denied = ctx.payment_service.delete_payment(&owner, payment.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    ctx.payment_service.delete_payment(&admin, payment.id).await?;

    // With the payment gone the summary falls back to Pending
    let summary = ctx.payment_service.payment_status(&owner, booking.id).await?;
    assert_eq!(summary.status, PaymentStatus::Pending);
    assert_eq!(summary.total_due, 20_000);

    Ok(())
}

#[tokio::test]
async fn test_payments_notify_owner() -> anyhow::Result<()> {
    let (ctx, worker, pool) = setup().await?;
    let admin = make_user(&ctx, "9820000005", "Admin", UserRole::Admin).await?;
    let owner = make_user(&ctx, "9820000006", "Priya", UserRole::Owner).await?;
    let (_, booking) = booked_property(&ctx, &owner).await?;

    ctx.booking_service
        .update_status(&owner, booking.id, BookingStatus::Confirmed)
        .await?;

    // Admin records an advance and then the balance
    ctx.payment_service
        .log_payment(
            &admin,
            payment_request(booking.id, 8_000, PaymentMethod::MobileTransfer, date(2026, 3, 1)),
        )
        .await?;
    ctx.payment_service
        .log_payment(
            &admin,
            payment_request(booking.id, 12_000, PaymentMethod::Cash, date(2026, 3, 4)),
        )
        .await?;

    drop(ctx);
    worker.await?;

    let notifications = SqliteNotificationRepository::new(pool.clone());
    let inbox = notifications.list_for_user(owner.id, 10, 0).await?;
    let kinds: Vec<NotificationKind> = inbox.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::PaymentReceived));
    assert!(kinds.contains(&NotificationKind::PaymentCompleted));

    Ok(())
}
