use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod property_repository;
pub mod invite_code_repository;
pub mod booking_repository;
pub mod payment_repository;
pub mod notification_repository;

pub use user_repository::SqliteUserRepository;
pub use property_repository::SqlitePropertyRepository;
pub use invite_code_repository::SqliteInviteCodeRepository;
pub use booking_repository::SqliteBookingRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use notification_repository::SqliteNotificationRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest, password_hash: Option<String>) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn update(&self, id: Uuid, update: UpdateUserRequest) -> Result<User>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn password_hash(&self, phone: &str) -> Result<Option<String>>;
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<()>;
    async fn link_managed_property(&self, user_id: Uuid, property_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: Property) -> Result<Property>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Property>>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>>;
    async fn update(&self, id: Uuid, update: UpdatePropertyRequest) -> Result<Property>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait InviteCodeRepository: Send + Sync {
    async fn create(&self, invite: InviteCode) -> Result<InviteCode>;
    async fn find_by_code(&self, code: &str) -> Result<Option<InviteCode>>;
    async fn list_for_property(&self, property_id: Uuid) -> Result<Vec<InviteCode>>;
    async fn list_created_by(&self, user_id: Uuid) -> Result<Vec<InviteCode>>;
    async fn increment_use(&self, id: Uuid) -> Result<()>;
    async fn deactivate(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking and claims one slot row per occupied night in a
    /// single transaction. A slot collision rolls everything back and
    /// surfaces as a conflict.
    async fn create(&self, booking: Booking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Booking>>;
    async fn list_for_property(&self, property_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Booking>>;
    /// Bookings whose check-in falls inside [from, to], the scan window for
    /// availability checks and calendars.
    async fn list_in_window(&self, property_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>>;
    async fn list_created_by(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Booking>>;
    /// Rewrites the booking row and its slot claims together; a collision on
    /// the new nights rolls back the whole update.
    async fn update(&self, id: Uuid, booking: Booking) -> Result<Booking>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: Notification) -> Result<Notification>;
    async fn list_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Notification>>;
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<()>;
}
