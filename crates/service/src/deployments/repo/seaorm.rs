use std::collections::{HashMap, HashSet};

use chrono::Utc;
use models::{deployment, deployment_file, service, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::deployments::domain::{DeploymentView, FileView, NewDeployment, NewFile};
use crate::deployments::repository::{DeploymentRepository, VERSION_CONFLICT};
use crate::errors::{is_unique_violation, ServiceError};

pub struct SeaOrmDeploymentRepository {
    pub db: DatabaseConnection,
}

fn map_insert_err(e: DbErr) -> ServiceError {
    if is_unique_violation(&e) {
        ServiceError::Conflict(VERSION_CONFLICT.into())
    } else {
        e.into()
    }
}

async fn insert_file_row<C: ConnectionTrait>(db: &C, deployment_id: Uuid, file: NewFile) -> Result<deployment_file::Model, DbErr> {
    deployment_file::ActiveModel {
        id: Set(Uuid::new_v4()),
        deployment_id: Set(deployment_id),
        file_name: Set(file.file_name),
        file_path: Set(file.file_path),
        file_type: Set(file.file_type),
        file_size: Set(file.file_size),
        uploaded_by: Set(file.uploaded_by),
        uploaded_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
}

impl SeaOrmDeploymentRepository {
    /// Attach service, creator and files to deployment rows with three queries in total.
    async fn hydrate(
        &self,
        rows: Vec<(deployment::Model, Option<service::Model>)>,
    ) -> Result<Vec<DeploymentView>, ServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|(d, _)| d.id).collect();
        let files = deployment_file::Entity::find()
            .filter(deployment_file::Column::DeploymentId.is_in(ids))
            .order_by_asc(deployment_file::Column::UploadedAt)
            .all(&self.db)
            .await?;

        let user_ids: HashSet<Uuid> = rows
            .iter()
            .filter_map(|(d, _)| d.created_by)
            .chain(files.iter().filter_map(|f| f.uploaded_by))
            .collect();
        let emails: HashMap<Uuid, String> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.email))
                .collect()
        };

        let mut files_by_deployment: HashMap<Uuid, Vec<FileView>> = HashMap::new();
        for file in files {
            let uploader_email = file.uploaded_by.and_then(|id| emails.get(&id).cloned());
            files_by_deployment
                .entry(file.deployment_id)
                .or_default()
                .push(FileView { file, uploader_email });
        }

        Ok(rows
            .into_iter()
            .map(|(d, svc)| DeploymentView {
                service_name: svc.as_ref().map(|s| s.name.clone()),
                application: svc.and_then(|s| s.application),
                creator_email: d.created_by.and_then(|id| emails.get(&id).cloned()),
                files: files_by_deployment.remove(&d.id).unwrap_or_default(),
                deployment: d,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl DeploymentRepository for SeaOrmDeploymentRepository {
    async fn service_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(service::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn version_exists(&self, service_id: Uuid, version: &str) -> Result<bool, ServiceError> {
        let n = deployment::Entity::find()
            .filter(deployment::Column::ServiceId.eq(service_id))
            .filter(deployment::Column::Version.eq(version))
            .count(&self.db)
            .await?;
        Ok(n > 0)
    }

    async fn deployment_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(deployment::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn insert(
        &self,
        new: NewDeployment,
        file: Option<NewFile>,
    ) -> Result<(deployment::Model, Option<deployment_file::Model>), ServiceError> {
        let txn = self.db.begin().await?;
        let created = deployment::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_id: Set(new.service_id),
            version: Set(new.version),
            changes: Set(new.changes),
            branch_name: Set(new.branch_name),
            created_by: Set(new.created_by),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(map_insert_err)?;
        let file_row = match file {
            Some(f) => Some(insert_file_row(&txn, created.id, f).await?),
            None => None,
        };
        txn.commit().await?;
        Ok((created, file_row))
    }

    async fn insert_file(&self, deployment_id: Uuid, file: NewFile) -> Result<deployment_file::Model, ServiceError> {
        Ok(insert_file_row(&self.db, deployment_id, file).await?)
    }

    async fn list(&self, service_id: Option<Uuid>) -> Result<Vec<DeploymentView>, ServiceError> {
        let mut query = deployment::Entity::find().find_also_related(service::Entity);
        if let Some(sid) = service_id {
            query = query.filter(deployment::Column::ServiceId.eq(sid));
        }
        let rows = query.order_by_desc(deployment::Column::CreatedAt).all(&self.db).await?;
        self.hydrate(rows).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<DeploymentView>, ServiceError> {
        let row = deployment::Entity::find_by_id(id)
            .find_also_related(service::Entity)
            .one(&self.db)
            .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn get_file(&self, file_id: Uuid) -> Result<Option<deployment_file::Model>, ServiceError> {
        Ok(deployment_file::Entity::find_by_id(file_id).one(&self.db).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>, ServiceError> {
        let txn = self.db.begin().await?;
        if deployment::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(None);
        }
        let paths: Vec<String> = deployment_file::Entity::find()
            .select_only()
            .column(deployment_file::Column::FilePath)
            .filter(deployment_file::Column::DeploymentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;
        deployment_file::Entity::delete_many()
            .filter(deployment_file::Column::DeploymentId.eq(id))
            .exec(&txn)
            .await?;
        deployment::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(Some(paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::domain::CreateDeployment;
    use crate::deployments::DeploymentService;
    use crate::storage::LocalFileStore;
    use crate::test_support::get_db;
    use tempfile::TempDir;
    use models::user::Role;
    use std::sync::Arc;

    #[tokio::test]
    async fn views_carry_service_creator_and_files() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let dir = TempDir::new().unwrap();
        let svc = DeploymentService::new(
            Arc::new(SeaOrmDeploymentRepository { db: db.clone() }),
            LocalFileStore::new(dir.path(), 1024),
        );

        let email = format!("dep_{}@example.com", Uuid::new_v4());
        let creator = user::create(&db, &email, "$argon2id$stub".into(), Role::User).await?;
        let target = service::create(&db, &format!("svc-{}", Uuid::new_v4()), None, Some("ami"), Some(creator.id)).await?;

        let stored = svc.store().save("notes.pdf", b"pdf").await?;
        let input = CreateDeployment { service_id: target.id, version: "1.0.0".into(), changes: Some("init".into()), branch_name: None };
        let (dep, _) = svc.create_with_file(input.clone(), Some(stored), Some(creator.id)).await?;

        let view = svc.get(dep.id).await?;
        assert_eq!(view.service_name.as_deref(), Some(target.name.as_str()));
        assert_eq!(view.application.as_deref(), Some("ami"));
        assert_eq!(view.creator_email.as_deref(), Some(email.as_str()));
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.files[0].uploader_email.as_deref(), Some(email.as_str()));

        let json = serde_json::to_value(&view)?;
        assert_eq!(json["version"], "1.0.0");
        assert!(json["files"][0].get("file_path").is_none());

        let dup = svc.create(input, Some(creator.id)).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        svc.delete(dep.id).await?;
        assert!(svc.list_by_service(target.id).await?.is_empty());
        service::Entity::delete_by_id(target.id).exec(&db).await?;
        user::delete(&db, creator.id).await?;
        Ok(())
    }
}
