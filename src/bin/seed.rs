use veranda::{
    auth::AuthService,
    domain::{
        Booking, BookingStatus, CreateUserRequest, InviteCode, Payment, PaymentMethod, Property,
        UserRole,
    },
    repository::{
        BookingRepository, InviteCodeRepository, PaymentRepository, PropertyRepository,
        SqliteBookingRepository, SqliteInviteCodeRepository, SqlitePaymentRepository,
        SqlitePropertyRepository, SqliteUserRepository, UserRepository,
    },
};

use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

#[derive(Parser)]
#[command(about = "Seed the database with demo users, properties and bookings")]
struct Args {
    /// Database to seed; falls back to DATABASE_URL, then sqlite:veranda.db
    #[arg(long)]
    database_url: Option<String>,

    /// Bookings to create per property
    #[arg(long, default_value_t = 6)]
    bookings: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:veranda.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    // Run migrations first
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Initialize repositories
    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let property_repo = SqlitePropertyRepository::new(db_pool.clone());
    let invite_repo = SqliteInviteCodeRepository::new(db_pool.clone());
    let booking_repo = SqliteBookingRepository::new(db_pool.clone());
    let payment_repo = SqlitePaymentRepository::new(db_pool.clone());

    // Seed users
    println!("👥 Creating users...");

    let admin_hash = AuthService::hash_password("admin123").await?;
    let admin = user_repo
        .create(
            CreateUserRequest {
                phone: "9800000001".to_string(),
                name: "Admin".to_string(),
                role: UserRole::Admin,
                password: None,
            },
            Some(admin_hash),
        )
        .await?;

    let owner_hash = AuthService::hash_password("password123").await?;
    let priya = user_repo
        .create(
            CreateUserRequest {
                phone: "9800000002".to_string(),
                name: "Priya Nair".to_string(),
                role: UserRole::Owner,
                password: None,
            },
            Some(owner_hash),
        )
        .await?;

    let rahul = user_repo
        .create(
            CreateUserRequest {
                phone: "9800000003".to_string(),
                name: "Rahul Menon".to_string(),
                role: UserRole::Agent,
                password: None,
            },
            None,
        )
        .await?;

    println!("  ✅ Created admin (9800000001 / admin123), owner and agent");

    // Seed properties
    println!("🏠 Creating properties...");

    let now = Utc::now();
    let hillside = property_repo
        .create(Property {
            id: Uuid::new_v4(),
            name: "Hillside Villa".to_string(),
            address: Some("12 Tea Estate Road, Munnar".to_string()),
            owner_id: priya.id,
            nightly_price: 450_000, // 4500.00 INR
            currency: "INR".to_string(),
            bedrooms: 3,
            max_guests: 6,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let lakeview = property_repo
        .create(Property {
            id: Uuid::new_v4(),
            name: "Lakeview Cottage".to_string(),
            address: Some("4 Backwater Lane, Alleppey".to_string()),
            owner_id: priya.id,
            nightly_price: 300_000,
            currency: "INR".to_string(),
            bedrooms: 2,
            max_guests: 4,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    println!("  ✅ Created 2 properties");

    // Seed an invite code and link the agent through it
    println!("🎟️  Creating invite code...");

    let invite = invite_repo
        .create(InviteCode {
            id: Uuid::new_v4(),
            code: "WELCOME1".to_string(),
            property_id: hillside.id,
            created_by: priya.id,
            expires_at: Some(now + Duration::days(90)),
            max_uses: 0,
            use_count: 0,
            active: true,
            created_at: now,
        })
        .await?;

    invite_repo.increment_use(invite.id).await?;
    user_repo.link_managed_property(rahul.id, hillside.id).await?;

    println!("  ✅ Created invite WELCOME1 and linked the agent");

    // Seed bookings with consecutive windows so the slot claims never collide
    println!("📅 Creating bookings...");

    let today = Utc::now().date_naive();
    let mut created = 0usize;
    for (property, start_offset) in [(&hillside, 3i64), (&lakeview, 5i64)] {
        for i in 0..args.bookings {
            let guest_name: String = Name().fake();
            let check_in = today + Duration::days(start_offset + (i as i64) * 7);
            let check_out = check_in + Duration::days(3);
            let total = property.nightly_price * 3;

            let status = match i % 4 {
                0 => BookingStatus::Confirmed,
                1 => BookingStatus::PendingConfirmation,
                2 => BookingStatus::Confirmed,
                _ => BookingStatus::Cancelled,
            };

            let booking = booking_repo
                .create(Booking {
                    id: Uuid::new_v4(),
                    property_id: property.id,
                    guest_name,
                    guest_phone: Some(format!("98{:08}", 10_000_000 + created)),
                    check_in,
                    check_out,
                    check_in_minute: None,
                    check_out_minute: None,
                    nightly_price: property.nightly_price,
                    total_amount: total,
                    currency: property.currency.clone(),
                    status,
                    created_by: if i % 2 == 0 { rahul.id } else { priya.id },
                    invite_code: if i % 2 == 0 { Some(invite.code.clone()) } else { None },
                    commission: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            created += 1;

            // First booking per property gets an advance, second is settled
            if i == 0 {
                payment_repo
                    .create(Payment {
                        id: Uuid::new_v4(),
                        booking_id: booking.id,
                        amount: total / 2,
                        currency: booking.currency.clone(),
                        method: PaymentMethod::MobileTransfer,
                        reference: Some(format!("UPI-{}", created)),
                        recorded_by: admin.id,
                        paid_on: today,
                        notes: Some("Advance".to_string()),
                        created_at: now,
                    })
                    .await?;
            } else if i == 2 {
                payment_repo
                    .create(Payment {
                        id: Uuid::new_v4(),
                        booking_id: booking.id,
                        amount: total,
                        currency: booking.currency.clone(),
                        method: PaymentMethod::BankTransfer,
                        reference: None,
                        recorded_by: admin.id,
                        paid_on: today,
                        notes: None,
                        created_at: now,
                    })
                    .await?;
            }
        }
    }

    println!("  ✅ Created {} bookings with payments", created);

    println!("\n✨ Database seeding complete!");
    println!("\n📝 Test accounts (login via /api/auth/otp/request in dev mode):");
    println!("  Admin: 9800000001 (password admin123 for /api/auth/login)");
    println!("  Owner: 9800000002 (password password123)");
    println!("  Agent: 9800000003");

    Ok(())
}
