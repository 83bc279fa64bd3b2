use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{BookingRepository, InviteCodeRepository, PropertyRepository, UserRepository},
};

const INVITE_CODE_ATTEMPTS: usize = 5;

pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
    invites: Arc<dyn InviteCodeRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
}

impl PropertyService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        invites: Arc<dyn InviteCodeRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            properties,
            invites,
            bookings,
            users,
        }
    }

    pub async fn create_property(
        &self,
        actor: &User,
        request: CreatePropertyRequest,
    ) -> Result<Property> {
        if !matches!(actor.role, UserRole::Admin | UserRole::Owner) {
            return Err(AppError::Forbidden);
        }
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Property name is required".to_string()));
        }
        if request.nightly_price < 0 {
            return Err(AppError::Validation(
                "Nightly price cannot be negative".to_string(),
            ));
        }

        // Admins may register on behalf of an owner; owners own what they create.
        let owner_id = match (actor.role, request.owner_id) {
            (UserRole::Admin, Some(owner_id)) => {
                self.users
                    .find_by_id(owner_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Owner not found".to_string()))?;
                owner_id
            }
            _ => actor.id,
        };

        let property = Property {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            address: request.address,
            owner_id,
            nightly_price: request.nightly_price,
            currency: request.currency.unwrap_or_else(|| "INR".to_string()),
            bedrooms: request.bedrooms.unwrap_or(1),
            max_guests: request.max_guests.unwrap_or(2),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.properties.create(property).await
    }

    pub async fn get_property(&self, actor: &User, id: Uuid) -> Result<Property> {
        let property = self
            .properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }
        Ok(property)
    }

    /// Properties visible to the actor: all for admins, owned for owners,
    /// managed for agents.
    pub async fn list_visible(&self, actor: &User, limit: i64, offset: i64) -> Result<Vec<Property>> {
        match actor.role {
            UserRole::Admin => self.properties.list(limit, offset).await,
            UserRole::Owner => self.properties.list_by_owner(actor.id).await,
            UserRole::Agent => {
                let mut properties = Vec::with_capacity(actor.managed_properties.len());
                for property_id in &actor.managed_properties {
                    if let Some(property) = self.properties.find_by_id(*property_id).await? {
                        properties.push(property);
                    }
                }
                Ok(properties)
            }
            UserRole::Guest => Ok(Vec::new()),
        }
    }

    pub async fn update_property(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdatePropertyRequest,
    ) -> Result<Property> {
        let property = self
            .properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        self.require_owner(actor, &property)?;

        if request.nightly_price.is_some_and(|p| p < 0) {
            return Err(AppError::Validation(
                "Nightly price cannot be negative".to_string(),
            ));
        }

        self.properties.update(id, request).await
    }

    /// Hard delete, kept for cleanup of mistakes. A property that has taken
    /// bookings can only be deactivated.
    pub async fn delete_property(&self, actor: &User, id: Uuid) -> Result<()> {
        let property = self
            .properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        self.require_owner(actor, &property)?;

        let bookings = self.bookings.list_for_property(id, 1, 0).await?;
        if !bookings.is_empty() {
            return Err(AppError::Conflict(
                "Property has bookings and cannot be deleted; deactivate it instead".to_string(),
            ));
        }

        self.properties.delete(id).await
    }

    pub async fn create_invite(
        &self,
        actor: &User,
        request: CreateInviteCodeRequest,
    ) -> Result<InviteCode> {
        let property = self
            .properties
            .find_by_id(request.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        self.require_owner(actor, &property)?;

        let now = Utc::now();
        if request.expires_at.is_some_and(|at| at <= now) {
            return Err(AppError::Validation(
                "Expiry must be in the future".to_string(),
            ));
        }
        if request.max_uses.is_some_and(|n| n < 0) {
            return Err(AppError::Validation(
                "Max uses cannot be negative".to_string(),
            ));
        }

        // Codes are short, so collisions are possible; retry a few times
        // before giving up.
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = generate_invite_code();
            if self.invites.find_by_code(&code).await?.is_some() {
                continue;
            }
            let invite = InviteCode {
                id: Uuid::new_v4(),
                code,
                property_id: property.id,
                created_by: actor.id,
                expires_at: request.expires_at,
                max_uses: request.max_uses.unwrap_or(0),
                use_count: 0,
                active: true,
                created_at: now,
            };
            return self.invites.create(invite).await;
        }

        Err(AppError::Internal(
            "Could not generate a unique invite code".to_string(),
        ))
    }

    pub async fn list_invites(&self, actor: &User, property_id: Uuid) -> Result<Vec<InviteCode>> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        self.require_owner(actor, &property)?;
        self.invites.list_for_property(property_id).await
    }

    /// An agent redeems a code to start managing the property. Burns one use
    /// and links the agent even if they already manage it.
    pub async fn claim_invite(&self, actor: &User, code: &str) -> Result<Property> {
        if actor.role != UserRole::Agent {
            return Err(AppError::Forbidden);
        }

        let invite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;

        if let Some(reason) = invite.usability_error(Utc::now()) {
            return Err(AppError::Conflict(reason.to_string()));
        }

        let property = self
            .properties
            .find_by_id(invite.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        self.invites.increment_use(invite.id).await?;
        self.users
            .link_managed_property(actor.id, property.id)
            .await?;

        Ok(property)
    }

    pub async fn deactivate_invite(&self, actor: &User, code: &str) -> Result<()> {
        let invite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;

        let property = self
            .properties
            .find_by_id(invite.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        self.require_owner(actor, &property)?;

        self.invites.deactivate(invite.id).await
    }

    /// Owner-or-admin gate for mutations; managing agents do not qualify.
    fn require_owner(&self, actor: &User, property: &Property) -> Result<()> {
        if actor.role == UserRole::Admin || property.owner_id == actor.id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn generate_invite_code() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes).to_uppercase()
}
