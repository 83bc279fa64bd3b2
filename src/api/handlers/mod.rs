pub mod analytics;
pub mod auth;
pub mod bookings;
pub mod notifications;
pub mod payments;
pub mod properties;
pub mod root;
pub mod users;
