use axum::{extract::{Path, State}, Json};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use common::types::Ack;
use service::user_service;

use crate::auth::{AdminUser, ServerState};
use crate::errors::{ApiPath, JsonApiError};

#[utoipa::path(get, path = "/api/users", tag = "users", responses((status = 200, description = "List OK"), (status = 403, description = "Forbidden")))]
pub async fn list(State(state): State<ServerState>, _admin: AdminUser) -> Result<Json<Value>, JsonApiError> {
    let users = user_service::list_users(&state.db).await?;
    info!(count = users.len(), "list users");
    Ok(Json(json!({ "success": true, "users": users })))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "Found"), (status = 404, description = "User not found")))]
pub async fn get(State(state): State<ServerState>, _admin: AdminUser, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Value>, JsonApiError> {
    let user = user_service::get_user(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "users", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "Deleted"), (status = 404, description = "User not found")))]
pub async fn delete(State(state): State<ServerState>, AdminUser(admin): AdminUser, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Ack>, JsonApiError> {
    user_service::delete_user(&state.db, id).await?;
    info!(user_id = %id, by = %admin.id, "user deleted");
    Ok(Json(Ack::ok("User deleted successfully")))
}
