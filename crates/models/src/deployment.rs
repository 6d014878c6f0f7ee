//! `deployments` table: a versioned release of a service.
//!
//! `(service_id, version)` is unique (`unique_service_version`).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{deployment_file, errors::ModelError, service, user};

pub const DEFAULT_BRANCH: &str = "main";
pub const MAX_VERSION_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub version: String,
    pub changes: Option<String>,
    pub branch_name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    Creator,
    Files,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
            Relation::Creator => Entity::belongs_to(user::Entity)
                .from(Column::CreatedBy)
                .to(user::Column::Id)
                .into(),
            Relation::Files => Entity::has_many(deployment_file::Entity).into(),
        }
    }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl Related<deployment_file::Entity> for Entity {
    fn to() -> RelationDef { Relation::Files.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Trimmed, non-empty, at most [`MAX_VERSION_LEN`] characters.
pub fn validate_version(version: &str) -> Result<String, ModelError> {
    let v = version.trim();
    if v.is_empty() {
        return Err(ModelError::Validation("version required".into()));
    }
    if v.chars().count() > MAX_VERSION_LEN {
        return Err(ModelError::Validation(format!("version too long (<={MAX_VERSION_LEN})")));
    }
    Ok(v.to_string())
}

/// Missing or blank branch names default to `main`.
pub fn normalize_branch(branch: Option<&str>) -> String {
    branch
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_BRANCH)
        .to_string()
}
