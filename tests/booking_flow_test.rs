use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use veranda::{
    config::Settings,
    domain::{
        BookingStatus, CreateBookingRequest, CreateInviteCodeRequest, CreatePropertyRequest,
        CreateUserRequest, NotificationKind, User, UserRole,
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

fn booking_request(property_id: uuid::Uuid, check_in: NaiveDate, nights: i64) -> CreateBookingRequest {
    CreateBookingRequest {
        property_id,
        guest_name: "Meera Pillai".to_string(),
        guest_phone: None,
        check_in,
        check_out: check_in + Duration::days(nights),
        check_in_minute: None,
        check_out_minute: None,
        total_amount: None,
        invite_code: None,
        commission: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_same_day_turnover() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9810000001", "Priya", UserRole::Owner).await?;

    let property = ctx
        .property_service
        .create_property(
            &owner,
            CreatePropertyRequest {
                name: "Hillside Villa".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 450_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    let first = ctx
        .booking_service
        .create_booking(&owner, booking_request(property.id, date(2026, 3, 10), 3))
        .await?;
    assert_eq!(first.status, BookingStatus::PendingConfirmation);
    assert_eq!(first.total_amount, 450_000 * 3);

    // Standard times: checkout 11:00 clears before arrival 14:00
    let turnover = ctx
        .booking_service
        .create_booking(&owner, booking_request(property.id, date(2026, 3, 13), 3))
        .await?;
    assert_eq!(turnover.check_in, first.check_out);

    // A real overlap is rejected
    let overlap = ctx
        .booking_service
        .create_booking(&owner, booking_request(property.id, date(2026, 3, 11), 2))
        .await;
    assert!(matches!(overlap, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn test_turnover_respects_time_of_day() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9810000002", "Priya", UserRole::Owner).await?;

    let property = ctx
        .property_service
        .create_property(
            &owner,
            CreatePropertyRequest {
                name: "Lakeview Cottage".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 300_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    // Late checkout at 17:00 on March 13
    let mut late_checkout = booking_request(property.id, date(2026, 3, 10), 3);
    late_checkout.check_out_minute = Some(17 * 60);
    ctx.booking_service
        .create_booking(&owner, late_checkout)
        .await?;

    // Standard arrival at 14:00 lands before the departing guest leaves
    let standard_arrival = booking_request(property.id, date(2026, 3, 13), 3);
    let result = ctx
        .booking_service
        .create_booking(&owner, standard_arrival)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // An 18:00 arrival clears the 17:00 departure
    let mut evening_arrival = booking_request(property.id, date(2026, 3, 13), 3);
    evening_arrival.check_in_minute = Some(18 * 60);
    ctx.booking_service
        .create_booking(&owner, evening_arrival)
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_cancel_frees_dates_and_revival_conflicts() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9810000003", "Priya", UserRole::Owner).await?;

    let property = ctx
        .property_service
        .create_property(
            &owner,
            CreatePropertyRequest {
                name: "Garden House".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 200_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    let original = ctx
        .booking_service
        .create_booking(&owner, booking_request(property.id, date(2026, 5, 1), 4))
        .await?;

    ctx.booking_service
        .update_status(&owner, original.id, BookingStatus::Cancelled)
        .await?;

    // The freed dates can be rebooked
    let replacement = ctx
        .booking_service
        .create_booking(&owner, booking_request(property.id, date(2026, 5, 1), 4))
        .await?;

    // Reviving the cancelled stay now collides with the replacement
    let revival = ctx
        .booking_service
        .update_status(&owner, original.id, BookingStatus::Confirmed)
        .await;
    assert!(matches!(revival, Err(AppError::Conflict(_))));

    let kept = ctx.booking_service.get_booking(&owner, replacement.id).await?;
    assert_eq!(kept.status, BookingStatus::PendingConfirmation);

    Ok(())
}

#[tokio::test]
async fn test_agent_invite_flow() -> anyhow::Result<()> {
    let (ctx, _worker, _pool) = setup().await?;
    let owner = make_user(&ctx, "9810000004", "Priya", UserRole::Owner).await?;
    let agent = make_user(&ctx, "9810000005", "Rahul", UserRole::Agent).await?;

    let property = ctx
        .property_service
        .create_property(
            &owner,
            CreatePropertyRequest {
                name: "Beach Hut".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 150_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    // The agent cannot see or book the property before claiming an invite
    let early = ctx
        .booking_service
        .create_booking(&agent, booking_request(property.id, date(2026, 6, 1), 2))
        .await;
    assert!(matches!(early, Err(AppError::Forbidden)));

    let invite = ctx
        .property_service
        .create_invite(
            &owner,
            CreateInviteCodeRequest {
                property_id: property.id,
                expires_at: Some(Utc::now() + Duration::days(30)),
                max_uses: Some(2),
            },
        )
        .await?;

    let claimed = ctx.property_service.claim_invite(&agent, &invite.code).await?;
    assert_eq!(claimed.id, property.id);

    // Claiming linked the agent, so booking with the code now works
    let agent = ctx.user_repo.find_by_id(agent.id).await?.unwrap();
    assert!(agent.managed_properties.contains(&property.id));

    let mut request = booking_request(property.id, date(2026, 6, 1), 2);
    request.invite_code = Some(invite.code.clone());
    ctx.booking_service.create_booking(&agent, request).await?;

    // Claim + booking exhausted both uses
    let second_agent = make_user(&ctx, "9810000006", "Sana", UserRole::Agent).await?;
    let exhausted = ctx
        .property_service
        .claim_invite(&second_agent, &invite.code)
        .await;
    assert!(matches!(exhausted, Err(AppError::Conflict(_))));

    // Unknown codes are a plain not-found
    let missing = ctx.property_service.claim_invite(&second_agent, "NOPE1234").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_booking_notifies_owner() -> anyhow::Result<()> {
    let (ctx, worker, pool) = setup().await?;
    let owner = make_user(&ctx, "9810000007", "Priya", UserRole::Owner).await?;
    let agent = make_user(&ctx, "9810000008", "Rahul", UserRole::Agent).await?;

    let property = ctx
        .property_service
        .create_property(
            &owner,
            CreatePropertyRequest {
                name: "Forest Cabin".to_string(),
                address: None,
                owner_id: None,
                nightly_price: 250_000,
                currency: None,
                bedrooms: None,
                max_guests: None,
            },
        )
        .await?;

    let invite = ctx
        .property_service
        .create_invite(
            &owner,
            CreateInviteCodeRequest {
                property_id: property.id,
                expires_at: None,
                max_uses: None,
            },
        )
        .await?;
    ctx.property_service.claim_invite(&agent, &invite.code).await?;
    let agent = ctx.user_repo.find_by_id(agent.id).await?.unwrap();

    let booking = ctx
        .booking_service
        .create_booking(&agent, booking_request(property.id, date(2026, 7, 1), 2))
        .await?;
    ctx.booking_service
        .update_status(&agent, booking.id, BookingStatus::Cancelled)
        .await?;

    // Dropping the context closes the queue; the worker drains it
    drop(ctx);
    worker.await?;

    let notifications = SqliteNotificationRepository::new(pool.clone());
    let owner_inbox = notifications.list_for_user(owner.id, 10, 0).await?;
    assert_eq!(owner_inbox.len(), 2);
    let kinds: Vec<NotificationKind> = owner_inbox.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::BookingCreated));
    assert!(kinds.contains(&NotificationKind::BookingCancelled));

    // The acting agent hears nothing about their own booking
    let agent_inbox = notifications.list_for_user(agent.id, 10, 0).await?;
    assert!(agent_inbox.is_empty());

    assert_eq!(notifications.unread_count(owner.id).await?, 2);

    Ok(())
}
