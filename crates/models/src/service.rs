//! `services` table: a logical application/module that receives deployments.
use sea_orm::{entity::prelude::*, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{application, deployment, errors::ModelError, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub application: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Creator,
    Deployments,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Creator => Entity::belongs_to(user::Entity)
                .from(Column::CreatedBy)
                .to(user::Column::Id)
                .into(),
            Relation::Deployments => Entity::has_many(deployment::Entity).into(),
        }
    }
}

impl Related<deployment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Deployments.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Creator.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let name = name.trim();
    if name.is_empty() { return Err(ModelError::Validation("name required".into())); }
    if name.chars().count() > 255 { return Err(ModelError::Validation("name too long (<=255)".into())); }
    Ok(())
}

/// Empty descriptions are stored as NULL.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string)
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    name: &str,
    description: Option<&str>,
    application_code: Option<&str>,
    created_by: Option<Uuid>,
) -> Result<Model, ModelError> {
    validate_name(name)?;
    let application = application::normalize(application_code)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        description: Set(normalize_description(description)),
        application: Set(application),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
