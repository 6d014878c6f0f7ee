use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{deployment, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployment_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub deployment_id: Uuid,
    pub file_name: String,
    /// Location inside the upload directory; internal only.
    #[serde(skip_serializing, default)]
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Deployment,
    Uploader,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Deployment => Entity::belongs_to(deployment::Entity)
                .from(Column::DeploymentId)
                .to(deployment::Column::Id)
                .into(),
            Relation::Uploader => Entity::belongs_to(user::Entity)
                .from(Column::UploadedBy)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<deployment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Deployment.def() }
}

impl ActiveModelBehavior for ActiveModel {}
