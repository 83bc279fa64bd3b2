pub mod user_service;
pub mod property_service;
pub mod booking_service;
pub mod payment_service;
pub mod analytics_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::notifier::Notifier;
use crate::repository::*;
use analytics_service::AnalyticsService;
use booking_service::BookingService;
use payment_service::PaymentService;
use property_service::PropertyService;
use user_service::UserService;

pub use analytics_service::{DashboardStats, PropertyReport};

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub property_repo: Arc<dyn PropertyRepository>,
    pub invite_repo: Arc<dyn InviteCodeRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub property_service: Arc<PropertyService>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    /// Builds the repository and service graph over one pool and starts the
    /// notification worker. The returned handle joins once the context (and
    /// every notifier clone) has been dropped and the queue drained.
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> (Self, JoinHandle<()>) {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let property_repo: Arc<dyn PropertyRepository> =
            Arc::new(SqlitePropertyRepository::new(db_pool.clone()));
        let invite_repo: Arc<dyn InviteCodeRepository> =
            Arc::new(SqliteInviteCodeRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let notification_repo: Arc<dyn NotificationRepository> =
            Arc::new(SqliteNotificationRepository::new(db_pool.clone()));

        let (notifier, worker) = Notifier::start(
            settings.notifications.queue_capacity,
            notification_repo.clone(),
        );

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            user_repo.clone(),
            settings.auth.clone(),
        ));
        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let property_service = Arc::new(PropertyService::new(
            property_repo.clone(),
            invite_repo.clone(),
            booking_repo.clone(),
            user_repo.clone(),
        ));
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            property_repo.clone(),
            invite_repo.clone(),
            user_repo.clone(),
            notifier.clone(),
            settings.booking.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            payment_repo.clone(),
            booking_repo.clone(),
            property_repo.clone(),
            notifier,
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            property_repo.clone(),
            booking_repo.clone(),
            payment_repo.clone(),
            settings.booking.clone(),
        ));

        (
            Self {
                user_repo,
                property_repo,
                invite_repo,
                booking_repo,
                payment_repo,
                notification_repo,
                auth_service,
                user_service,
                property_service,
                booking_service,
                payment_service,
                analytics_service,
                db_pool,
            },
            worker,
        )
    }
}
