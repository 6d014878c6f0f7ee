//! HS256 bearer tokens carrying the user's id, email and role.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

pub fn issue_token(user: &AuthUser, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };
    encode(&JwtHeader::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser { id: Uuid::new_v4(), email: "ops@example.com".into(), role }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let u = user(Role::Admin);
        let token = issue_token(&u, "secret", 24).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.email, "ops@example.com");
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_token(&user(Role::User), "secret", 24).unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(AuthError::TokenError(_))));
    }

    #[test]
    fn expired_token_rejected() {
        // Beyond jsonwebtoken's default 60s leeway
        let token = issue_token(&user(Role::User), "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(verify_token("not-a-jwt", "secret").is_err());
    }
}
