use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub property_id: Uuid,
    pub created_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    /// 0 means unlimited uses.
    pub max_uses: i64,
    pub use_count: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    /// Why this code cannot be used right now, or None if it can. Callers
    /// surface the reason verbatim so agents know whether to ask for a new
    /// code or just stop retrying.
    pub fn usability_error(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if !self.active {
            return Some("Invite code has been deactivated");
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Some("Invite code has expired");
            }
        }
        if self.max_uses > 0 && self.use_count >= self.max_uses {
            return Some("Invite code has no uses remaining");
        }
        None
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.usability_error(now).is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInviteCodeRequest {
    pub property_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
}
