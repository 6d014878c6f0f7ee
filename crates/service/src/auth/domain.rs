use models::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

impl TryFrom<models::user::Model> for AuthUser {
    type Error = models::errors::ModelError;

    fn try_from(u: models::user::Model) -> Result<Self, Self::Error> {
        Ok(AuthUser { id: u.id, email: u.email, role: Role::parse(&u.role)? })
    }
}

/// Domain credentials (hashed)
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

/// Login/registration result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}
