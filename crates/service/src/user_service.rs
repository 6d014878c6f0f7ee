use uuid::Uuid;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::info;

use models::user;
use crate::errors::ServiceError;

/// All users, newest first. Password hashes never serialize.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>, ServiceError> {
    Ok(user::list(db).await?)
}

/// Get a user by id.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}

/// Remove a user. Rows it created keep existing with the reference nulled.
pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    if !user::delete(db, id).await? {
        return Err(ServiceError::not_found("User"));
    }
    info!(user_id = %id, "user_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::user::Role;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn user_lookup_and_delete() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };

        let email = format!("svc_{}@example.com", Uuid::new_v4());
        let u = user::create(&db, &email, "$argon2id$stub".into(), Role::User).await?;

        let found = get_user(&db, u.id).await?;
        assert_eq!(found.email, email);
        assert!(list_users(&db).await?.iter().any(|x| x.id == u.id));

        delete_user(&db, u.id).await?;
        assert!(matches!(get_user(&db, u.id).await, Err(ServiceError::NotFound(m)) if m == "User not found"));
        assert!(matches!(delete_user(&db, u.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
