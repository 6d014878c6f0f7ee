use async_trait::async_trait;
use models::user::Role;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, email: &str, password_hash: String, role: Role) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    /// Replace the stored hash and role of an existing user.
    async fn reset_credentials(&self, user_id: Uuid, password_hash: String, role: Role) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,  // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, email: &str, password_hash: String, role: Role) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), email: email.to_string(), role };
            users.insert(email.to_string(), user.clone());
            self.creds.lock().unwrap().insert(user.id, Credentials { user_id: user.id, password_hash });
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn reset_credentials(&self, user_id: Uuid, password_hash: String, role: Role) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let user = users.values_mut().find(|u| u.id == user_id).ok_or(AuthError::NotFound)?;
            user.role = role;
            let updated = user.clone();
            self.creds.lock().unwrap().insert(user_id, Credentials { user_id, password_hash });
            Ok(updated)
        }
    }
}
