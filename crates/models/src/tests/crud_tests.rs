use crate::{deployment, deployment_file, service, user};
use crate::user::Role;
use super::test_db;
use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, Uuid::new_v4())
}

#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let email = unique_email("crud");
    let created = user::create(&db, &email, "$argon2id$stub".into(), Role::User).await?;
    assert_eq!(created.email, email);
    assert_eq!(created.role, "user");

    let found = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(found.id, created.id);

    let promoted = user::update_credentials(&db, found, "$argon2id$other".into(), Role::Admin).await?;
    assert!(promoted.is_admin());

    let listed = user::list(&db).await?;
    assert!(listed.iter().any(|u| u.id == created.id));

    assert!(user::delete(&db, created.id).await?);
    assert!(!user::delete(&db, created.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let email = unique_email("dup");
    let first = user::create(&db, &email, "h".into(), Role::User).await?;
    let second = user::create(&db, &email, "h".into(), Role::User).await;
    assert!(matches!(second, Err(crate::errors::ModelError::Duplicate(_))), "{second:?}");

    user::delete(&db, first.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_service_deployment_file_chain() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let owner = user::create(&db, &unique_email("owner"), "h".into(), Role::Admin).await?;
    let svc = service::create(&db, "billing", Some("invoices"), Some("ABB"), Some(owner.id)).await?;
    assert_eq!(svc.application.as_deref(), Some("abb"));

    let dep = deployment::ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(svc.id),
        version: Set("1.0.0".into()),
        changes: Set(Some("first".into())),
        branch_name: Set(deployment::normalize_branch(None)),
        created_by: Set(Some(owner.id)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&db)
    .await?;
    assert_eq!(dep.branch_name, "main");

    let file = deployment_file::ActiveModel {
        id: Set(Uuid::new_v4()),
        deployment_id: Set(dep.id),
        file_name: Set("notes.pdf".into()),
        file_path: Set("uploads/file-1.pdf".into()),
        file_type: Set("pdf".into()),
        file_size: Set(42),
        uploaded_by: Set(Some(owner.id)),
        uploaded_at: Set(Utc::now().into()),
    }
    .insert(&db)
    .await?;

    // Deleting the creator keeps the rows and nulls references
    user::delete(&db, owner.id).await?;
    let svc_after = service::Entity::find_by_id(svc.id).one(&db).await?.expect("service kept");
    assert!(svc_after.created_by.is_none());
    let file_after = deployment_file::Entity::find_by_id(file.id).one(&db).await?.expect("file kept");
    assert!(file_after.uploaded_by.is_none());

    service::Entity::delete_by_id(svc.id).exec(&db).await?;
    Ok(())
}
