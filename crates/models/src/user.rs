use sea_orm::{entity::prelude::*, Set, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ModelError::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl Model {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    if email.is_empty() { return Err(ModelError::Validation("email required".into())); }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

/// Insert a user. The caller is responsible for hashing the password.
pub async fn create<C: ConnectionTrait>(db: &C, email: &str, password_hash: String, role: Role) -> Result<Model, ModelError> {
    validate_email(email)?;
    if password_hash.trim().is_empty() { return Err(ModelError::Validation("password hash required".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_string()),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email.trim())).one(db).await?)
}

/// All users, newest first.
pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_desc(Column::CreatedAt).all(db).await?)
}

/// Replace password hash and role of an existing user.
pub async fn update_credentials<C: ConnectionTrait>(db: &C, existing: Model, password_hash: String, role: Role) -> Result<Model, ModelError> {
    let mut am: ActiveModel = existing.into();
    am.password_hash = Set(password_hash);
    am.role = Set(role.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Returns whether a row was removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
