use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use models::user::{self, Role};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};
use uuid::Uuid;

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    user::validate_email(email).map_err(|e| AuthError::Validation(e.to_string()))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user and issue a token for it.
    ///
    /// Only an admin `actor` may create another admin; everyone else gets the `user` role.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 24 });
    /// let input = RegisterInput { email: "user@example.com".into(), password: "Secret123".into(), role: None };
    /// let session = tokio_test::block_on(svc.register(input, None)).unwrap();
    /// assert_eq!(session.user.email, "user@example.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input, actor), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput, actor: Option<&AuthUser>) -> Result<AuthSession, AuthError> {
        let email = input.email.trim();
        validate_credentials(email, &input.password)?;

        let requested = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => Role::parse(r).map_err(|e| AuthError::Validation(e.to_string()))?,
            None => Role::User,
        };
        if requested == Role::Admin && !actor.is_some_and(AuthUser::is_admin) {
            return Err(AuthError::Forbidden);
        }

        if let Some(existing) = self.repo.find_user_by_email(email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self.repo.create_user(email, hash, requested).await?;
        info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user_registered");
        let token = token::issue_token(&user, &self.cfg.jwt_secret, self.cfg.token_ttl_hours)?;
        Ok(AuthSession { user, token })
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 24 });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), password: "Passw0rd".into(), role: None }, None));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(input.email.trim())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = token::issue_token(&user, &self.cfg.jwt_secret, self.cfg.token_ttl_hours)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Fresh view of the caller; the token may outlive the account.
    pub async fn current_user(&self, id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    /// Create the admin account, or reset its password and promote it if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim();
        validate_credentials(email, password)?;
        let hash = hash_password(password)?;
        let user = match self.repo.find_user_by_email(email).await? {
            Some(existing) => self.repo.reset_credentials(existing.id, hash, Role::Admin).await?,
            None => self.repo.create_user(email, hash, Role::Admin).await?,
        };
        info!(user_id = %user.id, "admin_seeded");
        Ok(user)
    }
}
