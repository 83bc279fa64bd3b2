use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use veranda::{
    domain::{Booking, BookingStatus, CreateUserRequest, Property, UserRole},
    error::AppError,
    repository::{
        BookingRepository, PropertyRepository, SqliteBookingRepository, SqlitePropertyRepository,
        SqliteUserRepository, UserRepository,
    },
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup() -> anyhow::Result<(SqlitePool, Property, Uuid)> {
    // Create an in-memory SQLite database
    let pool = SqlitePool::connect(":memory:").await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_repo = SqliteUserRepository::new(pool.clone());
    let owner = user_repo
        .create(
            CreateUserRequest {
                phone: "9811111111".to_string(),
                name: "Owner".to_string(),
                role: UserRole::Owner,
                password: None,
            },
            None,
        )
        .await?;

    let property_repo = SqlitePropertyRepository::new(pool.clone());
    let property = property_repo
        .create(Property {
            id: Uuid::new_v4(),
            name: "Test Villa".to_string(),
            address: None,
            owner_id: owner.id,
            nightly_price: 500_000,
            currency: "INR".to_string(),
            bedrooms: 2,
            max_guests: 4,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await?;

    Ok((pool, property, owner.id))
}

fn booking(
    property_id: Uuid,
    created_by: Uuid,
    check_in: NaiveDate,
    nights: i64,
    status: BookingStatus,
) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        property_id,
        guest_name: "Asha Verma".to_string(),
        guest_phone: Some("9822222222".to_string()),
        check_in,
        check_out: check_in + Duration::days(nights),
        check_in_minute: None,
        check_out_minute: None,
        nightly_price: 500_000,
        total_amount: 500_000 * nights,
        currency: "INR".to_string(),
        status,
        created_by,
        invite_code: None,
        commission: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_booking_crud() -> anyhow::Result<()> {
    let (pool, property, owner_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let created = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 10),
            3,
            BookingStatus::Confirmed,
        ))
        .await?;
    assert_eq!(created.guest_name, "Asha Verma");
    assert_eq!(created.status, BookingStatus::Confirmed);
    assert_eq!(created.nights(), 3);

    let found = repo.find_by_id(created.id).await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().check_in, date(2026, 3, 10));

    let listed = repo.list_for_property(property.id, 10, 0).await?;
    assert_eq!(listed.len(), 1);

    let in_window = repo
        .list_in_window(property.id, date(2026, 3, 1), date(2026, 4, 1))
        .await?;
    assert_eq!(in_window.len(), 1);

    let updated = repo.update_status(created.id, BookingStatus::CheckedIn).await?;
    assert_eq!(updated.status, BookingStatus::CheckedIn);

    repo.delete(created.id).await?;
    assert!(repo.find_by_id(created.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_overlapping_claims_conflict() -> anyhow::Result<()> {
    let (pool, property, owner_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.create(booking(
        property.id,
        owner_id,
        date(2026, 3, 10),
        3,
        BookingStatus::Confirmed,
    ))
    .await?;

    // Shares the night of Mar 12
    let result = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 12),
            2,
            BookingStatus::Confirmed,
        ))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The rollback leaves a single booking behind
    let listed = repo.list_for_property(property.id, 10, 0).await?;
    assert_eq!(listed.len(), 1);

    // Back-to-back is fine: the checkout night is not claimed
    repo.create(booking(
        property.id,
        owner_id,
        date(2026, 3, 13),
        2,
        BookingStatus::Confirmed,
    ))
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_cancelled_bookings_claim_nothing() -> anyhow::Result<()> {
    let (pool, property, owner_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    repo.create(booking(
        property.id,
        owner_id,
        date(2026, 3, 10),
        3,
        BookingStatus::Cancelled,
    ))
    .await?;

    // Same dates go through because the cancelled stay holds no nights
    repo.create(booking(
        property.id,
        owner_id,
        date(2026, 3, 10),
        3,
        BookingStatus::Confirmed,
    ))
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_status_change_moves_claims() -> anyhow::Result<()> {
    let (pool, property, owner_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let first = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 10),
            3,
            BookingStatus::Confirmed,
        ))
        .await?;

    // Cancelling releases the nights
    repo.update_status(first.id, BookingStatus::Cancelled).await?;
    let second = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 10),
            3,
            BookingStatus::Confirmed,
        ))
        .await?;

    // Reviving the first booking must fail while the second holds the nights
    let result = repo.update_status(first.id, BookingStatus::Confirmed).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The failed revival did not disturb the standing booking
    let kept = repo.find_by_id(second.id).await?;
    assert_eq!(kept.map(|b| b.status), Some(BookingStatus::Confirmed));

    Ok(())
}

#[tokio::test]
async fn test_update_reclaims_new_dates() -> anyhow::Result<()> {
    let (pool, property, owner_id) = setup().await?;
    let repo = SqliteBookingRepository::new(pool.clone());

    let movable = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 10),
            3,
            BookingStatus::Confirmed,
        ))
        .await?;
    let fixed = repo
        .create(booking(
            property.id,
            owner_id,
            date(2026, 3, 20),
            3,
            BookingStatus::Confirmed,
        ))
        .await?;

    // Moving onto the other booking's nights rolls back
    let mut onto_fixed = movable.clone();
    onto_fixed.check_in = date(2026, 3, 19);
    onto_fixed.check_out = date(2026, 3, 22);
    let result = repo.update(movable.id, onto_fixed).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The original nights are still held after the rollback
    let still_there = repo.find_by_id(movable.id).await?;
    assert_eq!(still_there.map(|b| b.check_in), Some(date(2026, 3, 10)));

    // Moving to free dates succeeds and releases the old nights
    let mut to_free = repo.find_by_id(movable.id).await?.unwrap();
    to_free.check_in = date(2026, 4, 1);
    to_free.check_out = date(2026, 4, 4);
    repo.update(movable.id, to_free).await?;

    repo.create(booking(
        property.id,
        owner_id,
        date(2026, 3, 10),
        3,
        BookingStatus::Confirmed,
    ))
    .await?;

    assert!(repo.find_by_id(fixed.id).await?.is_some());
    Ok(())
}
