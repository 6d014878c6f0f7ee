//! Services: the applications/modules that receive deployments.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::{application, deployment, deployment_file, service, user};
use crate::errors::ServiceError;
use crate::storage::LocalFileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateService {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
}

/// Partial update; absent fields are left untouched, blank optional fields are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateService {
    pub name: Option<String>,
    pub description: Option<String>,
    pub application: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    #[serde(flatten)]
    pub service: service::Model,
    pub creator_email: Option<String>,
}

impl From<(service::Model, Option<user::Model>)> for ServiceView {
    fn from((service, creator): (service::Model, Option<user::Model>)) -> Self {
        Self { service, creator_email: creator.map(|u| u.email) }
    }
}

pub async fn create_service(db: &DatabaseConnection, input: CreateService, created_by: Option<Uuid>) -> Result<service::Model, ServiceError> {
    let created = service::create(
        db,
        &input.name,
        input.description.as_deref(),
        input.application.as_deref(),
        created_by,
    )
    .await?;
    info!(service_id = %created.id, name = %created.name, "service_created");
    Ok(created)
}

/// Newest first, with the creator's email.
pub async fn list_services(db: &DatabaseConnection) -> Result<Vec<ServiceView>, ServiceError> {
    let rows = service::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(service::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(ServiceView::from).collect())
}

pub async fn get_service(db: &DatabaseConnection, id: Uuid) -> Result<ServiceView, ServiceError> {
    service::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .map(ServiceView::from)
        .ok_or_else(|| ServiceError::not_found("Service"))
}

pub async fn update_service(db: &DatabaseConnection, id: Uuid, input: UpdateService) -> Result<service::Model, ServiceError> {
    let existing = service::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Service"))?;
    let mut am: service::ActiveModel = existing.into();
    if let Some(name) = input.name.as_deref() {
        service::validate_name(name)?;
        am.name = Set(name.trim().to_string());
    }
    if let Some(description) = input.description.as_deref() {
        am.description = Set(service::normalize_description(Some(description)));
    }
    if let Some(code) = input.application.as_deref() {
        am.application = Set(application::normalize(Some(code))?);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(service_id = %id, "service_updated");
    Ok(updated)
}

/// Delete a service with its deployments and their files.
///
/// Rows go in one transaction (files, deployments, service); stored files are
/// removed from disk only after the commit.
pub async fn delete_service(db: &DatabaseConnection, store: &LocalFileStore, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    if service::Entity::find_by_id(id).one(&txn).await?.is_none() {
        return Err(ServiceError::not_found("Service"));
    }

    let deployment_ids: Vec<Uuid> = deployment::Entity::find()
        .select_only()
        .column(deployment::Column::Id)
        .filter(deployment::Column::ServiceId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;

    let mut paths = Vec::new();
    if !deployment_ids.is_empty() {
        paths = deployment_file::Entity::find()
            .select_only()
            .column(deployment_file::Column::FilePath)
            .filter(deployment_file::Column::DeploymentId.is_in(deployment_ids.clone()))
            .into_tuple::<String>()
            .all(&txn)
            .await?;
        deployment_file::Entity::delete_many()
            .filter(deployment_file::Column::DeploymentId.is_in(deployment_ids.clone()))
            .exec(&txn)
            .await?;
        deployment::Entity::delete_many()
            .filter(deployment::Column::ServiceId.eq(id))
            .exec(&txn)
            .await?;
    }
    service::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    store.remove_all(paths).await;
    info!(service_id = %id, deployments = deployment_ids.len(), "service_deleted");
    Ok(())
}
