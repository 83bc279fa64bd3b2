use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::AuthService,
    domain::{normalize_phone, CreateUserRequest, UpdateUserRequest, User, UserRole},
    error::{AppError, Result},
    repository::UserRepository,
};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<User> {
        if actor.role != UserRole::Admin && actor.id != id {
            return Err(AppError::Forbidden);
        }
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self, actor: &User, limit: i64, offset: i64) -> Result<Vec<User>> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        self.users.list(limit, offset).await
    }

    pub async fn create_user(&self, actor: &User, mut request: CreateUserRequest) -> Result<User> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        request.phone = normalize_phone(&request.phone)
            .ok_or_else(|| AppError::Validation("Invalid phone number".to_string()))?;
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let password_hash = match request.password.take() {
            Some(password) => {
                validate_password(&password)?;
                Some(AuthService::hash_password(&password).await?)
            }
            None => None,
        };

        self.users.create(request, password_hash).await
    }

    /// Admins may change anything; everyone else is limited to renaming
    /// themselves.
    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<User> {
        let self_edit = actor.id == id && request.role.is_none();
        if actor.role != UserRole::Admin && !self_edit {
            return Err(AppError::Forbidden);
        }
        self.users.update(id, request).await
    }

    pub async fn delete_user(&self, actor: &User, id: Uuid) -> Result<()> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        self.users.delete(id).await
    }

    pub async fn set_password(&self, actor: &User, id: Uuid, password: &str) -> Result<()> {
        if actor.role != UserRole::Admin && actor.id != id {
            return Err(AppError::Forbidden);
        }
        validate_password(password)?;
        let hash = AuthService::hash_password(password).await?;
        self.users.set_password_hash(id, &hash).await
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}
