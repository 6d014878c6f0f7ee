use models::errors::ModelError;
use models::user::{self, Role};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: user::Model) -> Result<AuthUser, AuthError> {
    AuthUser::try_from(u).map_err(|e| AuthError::Repository(e.to_string()))
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn create_user(&self, email: &str, password_hash: String, role: Role) -> Result<AuthUser, AuthError> {
        match user::create(&self.db, email, password_hash, role).await {
            Ok(created) => to_auth_user(created),
            Err(ModelError::Validation(msg)) => Err(AuthError::Validation(msg)),
            // Lost a race with a concurrent registration of the same email
            Err(ModelError::Duplicate(_)) => Err(AuthError::Conflict),
            Err(e) => Err(AuthError::Repository(e.to_string())),
        }
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| Credentials { user_id: u.id, password_hash: u.password_hash }))
    }

    async fn reset_credentials(&self, user_id: Uuid, password_hash: String, role: Role) -> Result<AuthUser, AuthError> {
        let existing = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?
            .ok_or(AuthError::NotFound)?;
        let updated = user::update_credentials(&self.db, existing, password_hash, role)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        to_auth_user(updated)
    }
}
