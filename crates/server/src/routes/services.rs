use axum::{extract::{Path, State}, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use common::types::Ack;
use service::service_registry::{self, CreateService, UpdateService};

use crate::auth::{AdminUser, CurrentUser, ServerState};
use crate::errors::{ApiJson, ApiPath, JsonApiError};

#[utoipa::path(get, path = "/api/services", tag = "services", responses((status = 200, description = "List OK"), (status = 401, description = "Unauthorized")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Value>, JsonApiError> {
    let services = service_registry::list_services(&state.db).await?;
    Ok(Json(json!({ "success": true, "services": services })))
}

#[utoipa::path(post, path = "/api/services", tag = "services", request_body = crate::openapi::CreateServiceDoc, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    WithRejection(Json(input), _): ApiJson<CreateService>,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let created = service_registry::create_service(&state.db, input, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "service": created }))))
}

#[utoipa::path(get, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), responses((status = 200, description = "Found"), (status = 404, description = "Service not found")))]
pub async fn get(State(state): State<ServerState>, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Value>, JsonApiError> {
    let found = service_registry::get_service(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "service": found })))
}

#[utoipa::path(put, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), request_body = crate::openapi::UpdateServiceDoc, responses((status = 200, description = "Updated"), (status = 403, description = "Forbidden"), (status = 404, description = "Service not found")))]
pub async fn update(
    State(state): State<ServerState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(input), _): ApiJson<UpdateService>,
) -> Result<Json<Value>, JsonApiError> {
    let updated = service_registry::update_service(&state.db, id, input).await?;
    Ok(Json(json!({ "success": true, "service": updated })))
}

/// Cascades to the service's deployments and their stored files.
#[utoipa::path(delete, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Service not found")))]
pub async fn delete(State(state): State<ServerState>, AdminUser(admin): AdminUser, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Ack>, JsonApiError> {
    service_registry::delete_service(&state.db, &state.store, id).await?;
    info!(service_id = %id, by = %admin.id, "service deleted");
    Ok(Json(Ack::ok("Service deleted successfully")))
}
