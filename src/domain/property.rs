use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub owner_id: Uuid,
    /// Nightly price in minor currency units (paise, cents).
    pub nightly_price: i64,
    pub currency: String,
    pub bedrooms: i32,
    pub max_guests: i32,
    /// Inactive properties cannot accept new bookings.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address: Option<String>,
    /// Admins may create properties on behalf of an owner; owners always
    /// create their own and this field is ignored.
    pub owner_id: Option<Uuid>,
    pub nightly_price: i64,
    pub currency: Option<String>,
    pub bedrooms: Option<i32>,
    pub max_guests: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePropertyRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub nightly_price: Option<i64>,
    pub currency: Option<String>,
    pub bedrooms: Option<i32>,
    pub max_guests: Option<i32>,
    pub active: Option<bool>,
}
