use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Property;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub role: UserRole,
    /// Properties an agent has been linked to via invite codes. Empty for
    /// other roles.
    pub managed_properties: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Admins see everything; owners their own properties; agents the
    /// properties they were invited to.
    pub fn can_manage(&self, property: &Property) -> bool {
        self.role == UserRole::Admin
            || property.owner_id == self.id
            || self.managed_properties.contains(&property.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum UserRole {
    Admin,
    Owner,
    Agent,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Owner => "owner",
            UserRole::Agent => "agent",
            UserRole::Guest => "guest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "owner" => Some(UserRole::Owner),
            "agent" => Some(UserRole::Agent),
            "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub phone: String,
    pub name: String,
    pub role: UserRole,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

/// Normalize a phone number to digits with an optional leading +.
///
/// Accepts separators users commonly paste in (spaces, dashes, parentheses)
/// and rejects anything else. Returns None for empty or malformed input.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };
    let mut digits = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !matches!(c, ' ' | '-' | '(' | ')') {
            return None;
        }
    }
    if digits.len() < 7 || digits.len() > 15 {
        return None;
    }
    Some(format!("{}{}", plus, digits))
}
