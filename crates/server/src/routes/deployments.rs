use axum::{
    body::Body,
    extract::{Multipart, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use service::deployments::domain::CreateDeployment;
use service::deployments::service::FILE_REQUIRED;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};
use uuid::Uuid;

use common::types::Ack;

use crate::auth::{AdminUser, CurrentUser, ServerState};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::upload::read_form;

#[utoipa::path(get, path = "/api/deployments", tag = "deployments", responses((status = 200, description = "List OK"), (status = 401, description = "Unauthorized")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Value>, JsonApiError> {
    let deployments = state.deployments.list().await?;
    Ok(Json(json!({ "success": true, "deployments": deployments })))
}

#[utoipa::path(get, path = "/api/deployments/service/{service_id}", tag = "deployments", params(("service_id" = Uuid, Path, description = "Service id")), responses((status = 200, description = "List OK")))]
pub async fn list_by_service(State(state): State<ServerState>, WithRejection(Path(service_id), _): ApiPath<Uuid>) -> Result<Json<Value>, JsonApiError> {
    let deployments = state.deployments.list_by_service(service_id).await?;
    Ok(Json(json!({ "success": true, "deployments": deployments })))
}

#[utoipa::path(get, path = "/api/deployments/{id}", tag = "deployments", params(("id" = Uuid, Path, description = "Deployment id")), responses((status = 200, description = "Found"), (status = 404, description = "Deployment not found")))]
pub async fn get(State(state): State<ServerState>, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Value>, JsonApiError> {
    let deployment = state.deployments.get(id).await?;
    Ok(Json(json!({ "success": true, "deployment": deployment })))
}

/// Record a deployment without a file.
#[utoipa::path(post, path = "/api/deployments", tag = "deployments", request_body = crate::openapi::CreateDeploymentDoc, responses((status = 201, description = "Created"), (status = 404, description = "Service not found"), (status = 409, description = "Version already exists")))]
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    WithRejection(Json(input), _): ApiJson<CreateDeployment>,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let created = state.deployments.create(input, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "deployment": created }))))
}

/// Multipart `serviceId`, `version`, `changes`, `branchName` and the mandatory `file`.
#[utoipa::path(post, path = "/api/deployments/with-file", tag = "deployments", responses((status = 201, description = "Created"), (status = 400, description = "Invalid or missing file"), (status = 409, description = "Version already exists"), (status = 413, description = "File too large")))]
pub async fn create_with_file(
    State(state): State<ServerState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let mut form = read_form(&state.store, multipart).await?;
    let Some(file) = form.file.take() else {
        return Err(JsonApiError::bad_request(FILE_REQUIRED));
    };
    let input = match form.deployment_input() {
        Ok(input) => input,
        Err(e) => {
            state.store.remove_all([file.path]).await;
            return Err(e);
        }
    };
    let (deployment, file) = state.deployments.create_with_file(input, Some(file), Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "deployment": deployment, "file": file }))))
}

#[utoipa::path(post, path = "/api/deployments/{id}/files", tag = "deployments", params(("id" = Uuid, Path, description = "Deployment id")), responses((status = 201, description = "Uploaded"), (status = 400, description = "No file uploaded"), (status = 404, description = "Deployment not found")))]
pub async fn upload_file(
    State(state): State<ServerState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let mut form = read_form(&state.store, multipart).await?;
    let Some(stored) = form.file.take() else {
        return Err(JsonApiError::bad_request("No file uploaded"));
    };
    let file = state.deployments.attach_file(id, stored, Some(admin.id)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "file": file }))))
}

#[utoipa::path(get, path = "/api/deployments/files/{file_id}", tag = "deployments", params(("file_id" = Uuid, Path, description = "File id")), responses((status = 200, description = "File content"), (status = 404, description = "File not found")))]
pub async fn download_file(
    State(state): State<ServerState>,
    WithRejection(Path(file_id), _): ApiPath<Uuid>,
    req: Request,
) -> Result<Response, JsonApiError> {
    let file = state.deployments.get_file(file_id).await?;
    if tokio::fs::metadata(&file.file_path).await.is_err() {
        warn!(file_id = %file_id, path = %file.file_path, "stored file missing on disk");
        return Err(JsonApiError::not_found("File not found"));
    }
    let res = ServeFile::new(&file.file_path)
        .oneshot(req)
        .await
        .map_err(JsonApiError::internal)?;
    let mut res = res.map(Body::new).into_response();
    let disposition = HeaderValue::from_str(&content_disposition(&file.file_name)).map_err(JsonApiError::internal)?;
    res.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);
    Ok(res)
}

#[utoipa::path(delete, path = "/api/deployments/{id}", tag = "deployments", params(("id" = Uuid, Path, description = "Deployment id")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Deployment not found")))]
pub async fn delete(State(state): State<ServerState>, AdminUser(admin): AdminUser, WithRejection(Path(id), _): ApiPath<Uuid>) -> Result<Json<Ack>, JsonApiError> {
    state.deployments.delete(id).await?;
    info!(deployment_id = %id, by = %admin.id, "deployment deleted");
    Ok(Json(Ack::ok("Deployment deleted successfully")))
}

/// `attachment` with an ASCII fallback name and the RFC 5987 UTF-8 form.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, encoded)
}
