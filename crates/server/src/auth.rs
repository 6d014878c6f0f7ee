use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use models::user::Role;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::auth::token::{verify_token, Claims};
use service::deployments::repo::seaorm::SeaOrmDeploymentRepository;
use service::deployments::DeploymentService;
use service::storage::LocalFileStore;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";
pub const TOKEN_HEADER: &str = "x-auth-token";

const MISSING_TOKEN: &str = "No token, authorization denied";
const INVALID_TOKEN: &str = "Token is not valid";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub store: LocalFileStore,
    pub deployments: Arc<DeploymentService<SeaOrmDeploymentRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, auth: ServerAuthConfig, store: LocalFileStore) -> Self {
        let repo = Arc::new(SeaOrmDeploymentRepository { db: db.clone() });
        let deployments = Arc::new(DeploymentService::new(repo, store.clone()));
        Self { db, auth, store, deployments }
    }

    pub fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        AuthService::new(
            Arc::new(SeaOrmAuthRepository { db: self.db.clone() }),
            AuthConfig { jwt_secret: self.auth.jwt_secret.clone(), token_ttl_hours: self.auth.token_ttl_hours },
        )
    }
}

/// Caller identity taken from a verified token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

impl From<Claims> for CurrentUser {
    fn from(c: Claims) -> Self {
        Self { id: c.sub, email: c.email, role: c.role }
    }
}

impl From<&CurrentUser> for service::auth::domain::AuthUser {
    fn from(u: &CurrentUser) -> Self {
        Self { id: u.id, email: u.email.clone(), role: u.role }
    }
}

/// Token carriers in order: `x-auth-token`, `Authorization: Bearer`, `auth_token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(t) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        let t = t.trim();
        if !t.is_empty() {
            return Some(t.to_string());
        }
    }
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(t) = h.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty()) {
            return Some(t.to_string());
        }
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Verified caller, if the request carries a valid token.
pub fn optional_caller(headers: &HeaderMap, secret: &str) -> Option<CurrentUser> {
    let token = extract_token(headers)?;
    verify_token(&token, secret).ok().map(CurrentUser::from)
}

/// 校验 token 并将调用者写入请求扩展；缺失或非法均返回 401
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(req.headers()) else {
        tracing::warn!(path = %path, "missing auth token");
        return Err(JsonApiError::unauthorized(MISSING_TOKEN));
    };
    match verify_token(&token, &state.auth.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(CurrentUser::from(claims));
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            Err(JsonApiError::unauthorized(INVALID_TOKEN))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| JsonApiError::unauthorized(MISSING_TOKEN))
    }
}

/// Authenticated caller with the admin role; others get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "admin route denied");
            return Err(JsonApiError::forbidden());
        }
        Ok(AdminUser(user))
    }
}
