use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use tracing::info;

use common::types::Ack;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};

use crate::auth::{optional_caller, CurrentUser, ServerState, AUTH_COOKIE};
use crate::errors::{ApiJson, JsonApiError};

#[derive(Serialize)]
pub struct SessionOutput {
    pub success: bool,
    pub token: String,
    pub user: AuthUser,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub success: bool,
    pub user: AuthUser,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Only a caller holding an admin token may register another admin.
#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    headers: HeaderMap,
    WithRejection(Json(input), _): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<SessionOutput>), JsonApiError> {
    let caller = optional_caller(&headers, &state.auth.jwt_secret).map(|c| AuthUser::from(&c));
    let session = state.auth_service().register(input, caller.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(SessionOutput { success: true, token: session.token, user: session.user })))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    WithRejection(Json(input), _): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<SessionOutput>), JsonApiError> {
    let session = state.auth_service().login(input).await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, Json(SessionOutput { success: true, token: session.token, user: session.user })))
}

/// Tokens are stateless; logging out only clears the cookie.
#[utoipa::path(get, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Logged Out"), (status = 401, description = "Unauthorized")))]
pub async fn logout(user: CurrentUser, jar: CookieJar) -> (CookieJar, Json<Ack>) {
    info!(user_id = %user.id, "user_logged_out");
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, Json(Ack::ok("Logged out successfully")))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current User"), (status = 401, description = "Unauthorized"), (status = 404, description = "User not found")))]
pub async fn me(State(state): State<ServerState>, user: CurrentUser) -> Result<Json<MeOutput>, JsonApiError> {
    let user = state.auth_service().current_user(user.id).await?;
    Ok(Json(MeOutput { success: true, user }))
}
