use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_hours: i64,
    pub otp_expiry_minutes: i64,
    /// Dev mode echoes the OTP back in the request-otp response instead of
    /// dispatching it over SMS.
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// How far back the availability scan looks for stays that might still
    /// overlap the requested range.
    pub lookback_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Capacity of the in-process delivery queue. Events beyond this are
    /// dropped with a warning rather than blocking the request path.
    pub queue_capacity: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { lookback_days: 90 }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { queue_capacity: 256 }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_duration_hours", 24)?
            .set_default("auth.otp_expiry_minutes", 5)?
            .set_default("auth.dev_mode", false)?
            .set_default("booking.lookback_days", 90)?
            .set_default("notifications.queue_capacity", 256)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with VERANDA__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("VERANDA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://veranda.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_duration_hours: 24,
                otp_expiry_minutes: 5,
                dev_mode: false,
            },
            booking: BookingConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}
