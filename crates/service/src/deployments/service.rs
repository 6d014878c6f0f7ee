use std::sync::Arc;

use common::metrics::{DEPLOYMENTS_CREATED_TOTAL, UPLOADED_BYTES_TOTAL};
use models::{deployment, deployment_file};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{CreateDeployment, DeploymentView, NewDeployment, NewFile};
use super::repository::{DeploymentRepository, VERSION_CONFLICT};
use crate::errors::ServiceError;
use crate::storage::{LocalFileStore, StoredFile};

pub const FILE_REQUIRED: &str = "File upload is mandatory for deployment creation";

/// Deployment workflows over a repository and the upload directory.
pub struct DeploymentService<R: DeploymentRepository> {
    repo: Arc<R>,
    store: LocalFileStore,
}

fn to_new_file(stored: &StoredFile, uploaded_by: Option<Uuid>) -> NewFile {
    NewFile {
        file_name: stored.original_name.clone(),
        file_path: stored.path.to_string_lossy().into_owned(),
        file_type: stored.file_type.clone(),
        file_size: stored.size as i64,
        uploaded_by,
    }
}

impl<R: DeploymentRepository> DeploymentService<R> {
    pub fn new(repo: Arc<R>, store: LocalFileStore) -> Self { Self { repo, store } }

    pub fn store(&self) -> &LocalFileStore { &self.store }

    /// Validate fields and check the target service and version.
    async fn prepare(&self, input: CreateDeployment, actor: Option<Uuid>) -> Result<NewDeployment, ServiceError> {
        let version = deployment::validate_version(&input.version)?;
        if !self.repo.service_exists(input.service_id).await? {
            return Err(ServiceError::not_found("Service"));
        }
        if self.repo.version_exists(input.service_id, &version).await? {
            return Err(ServiceError::Conflict(VERSION_CONFLICT.into()));
        }
        Ok(NewDeployment {
            service_id: input.service_id,
            version,
            changes: input.changes.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            branch_name: deployment::normalize_branch(input.branch_name.as_deref()),
            created_by: actor,
        })
    }

    /// Record a deployment without documentation.
    #[instrument(skip(self, input), fields(service_id = %input.service_id, version = %input.version))]
    pub async fn create(&self, input: CreateDeployment, actor: Option<Uuid>) -> Result<deployment::Model, ServiceError> {
        let new = self.prepare(input, actor).await?;
        let (created, _) = self.repo.insert(new, None).await?;
        DEPLOYMENTS_CREATED_TOTAL.inc();
        info!(deployment_id = %created.id, "deployment_created");
        Ok(created)
    }

    /// Record a deployment together with its mandatory documentation file.
    ///
    /// The stored file is removed again whenever the deployment is not created.
    #[instrument(skip(self, input, file), fields(service_id = %input.service_id, version = %input.version))]
    pub async fn create_with_file(
        &self,
        input: CreateDeployment,
        file: Option<StoredFile>,
        actor: Option<Uuid>,
    ) -> Result<(deployment::Model, deployment_file::Model), ServiceError> {
        let Some(stored) = file else {
            return Err(ServiceError::Validation(FILE_REQUIRED.into()));
        };
        match self.insert_with_file(input, &stored, actor).await {
            Ok(out) => {
                DEPLOYMENTS_CREATED_TOTAL.inc();
                UPLOADED_BYTES_TOTAL.inc_by(stored.size);
                info!(deployment_id = %out.0.id, file_id = %out.1.id, bytes = stored.size, "deployment_created");
                Ok(out)
            }
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    async fn insert_with_file(
        &self,
        input: CreateDeployment,
        stored: &StoredFile,
        actor: Option<Uuid>,
    ) -> Result<(deployment::Model, deployment_file::Model), ServiceError> {
        let new = self.prepare(input, actor).await?;
        let (created, file_row) = self.repo.insert(new, Some(to_new_file(stored, actor))).await?;
        let file_row = file_row.ok_or_else(|| ServiceError::Db("file row not returned".into()))?;
        Ok((created, file_row))
    }

    /// Attach another documentation file to an existing deployment.
    #[instrument(skip(self, stored))]
    pub async fn attach_file(
        &self,
        deployment_id: Uuid,
        stored: StoredFile,
        actor: Option<Uuid>,
    ) -> Result<deployment_file::Model, ServiceError> {
        let res = match self.repo.deployment_exists(deployment_id).await {
            Ok(true) => self.repo.insert_file(deployment_id, to_new_file(&stored, actor)).await,
            Ok(false) => Err(ServiceError::not_found("Deployment")),
            Err(e) => Err(e),
        };
        match res {
            Ok(row) => {
                UPLOADED_BYTES_TOTAL.inc_by(stored.size);
                info!(file_id = %row.id, bytes = stored.size, "deployment_file_uploaded");
                Ok(row)
            }
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<DeploymentView>, ServiceError> {
        self.repo.list(None).await
    }

    pub async fn list_by_service(&self, service_id: Uuid) -> Result<Vec<DeploymentView>, ServiceError> {
        self.repo.list(Some(service_id)).await
    }

    pub async fn get(&self, id: Uuid) -> Result<DeploymentView, ServiceError> {
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Deployment"))
    }

    pub async fn get_file(&self, file_id: Uuid) -> Result<deployment_file::Model, ServiceError> {
        self.repo.get_file(file_id).await?.ok_or_else(|| ServiceError::not_found("File"))
    }

    /// Delete the deployment's file rows and the deployment, then the stored files.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let paths = self.repo.delete(id).await?.ok_or_else(|| ServiceError::not_found("Deployment"))?;
        let removed = paths.len();
        self.store.remove_all(paths).await;
        info!(deployment_id = %id, files = removed, "deployment_deleted");
        Ok(())
    }

    async fn discard(&self, stored: &StoredFile) {
        if let Err(e) = self.store.remove(&stored.path).await {
            warn!(path = %stored.path.display(), error = %e, "orphan_upload_remove_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::repository::mock::MockDeploymentRepository;
    use tempfile::TempDir;

    struct Fixture {
        svc: DeploymentService<MockDeploymentRepository>,
        repo: Arc<MockDeploymentRepository>,
        dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(MockDeploymentRepository::default());
        let svc = DeploymentService::new(repo.clone(), LocalFileStore::new(dir.path(), 1024));
        Fixture { svc, repo, dir }
    }

    fn input(service_id: Uuid, version: &str) -> CreateDeployment {
        CreateDeployment { service_id, version: version.into(), changes: None, branch_name: None }
    }

    fn files_in(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn create_defaults_branch_and_trims_version() {
        let f = fixture();
        let sid = f.repo.add_service("billing");
        let created = f.svc.create(input(sid, " 2.1.0 "), None).await.unwrap();
        assert_eq!(created.version, "2.1.0");
        assert_eq!(created.branch_name, "main");
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let f = fixture();
        let err = f.svc.create(input(Uuid::new_v4(), "1.0"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Service not found"));
    }

    #[tokio::test]
    async fn duplicate_version_conflicts_per_service() {
        let f = fixture();
        let a = f.repo.add_service("a");
        let b = f.repo.add_service("b");
        f.svc.create(input(a, "1.0"), None).await.unwrap();
        let err = f.svc.create(input(a, "1.0"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(m) if m == VERSION_CONFLICT));
        // Same version on another service is fine
        f.svc.create(input(b, "1.0"), None).await.unwrap();
    }

    #[tokio::test]
    async fn create_with_file_requires_file() {
        let f = fixture();
        let sid = f.repo.add_service("a");
        let err = f.svc.create_with_file(input(sid, "1.0"), None, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == FILE_REQUIRED));
    }

    #[tokio::test]
    async fn create_with_file_links_file_and_lists_it() {
        let f = fixture();
        let sid = f.repo.add_service("billing");
        let actor = Uuid::new_v4();
        let stored = f.svc.store().save("notes.docx", b"doc").await.unwrap();
        let (dep, file) = f.svc.create_with_file(input(sid, "3.0"), Some(stored), Some(actor)).await.unwrap();
        assert_eq!(file.deployment_id, dep.id);
        assert_eq!(file.file_type, "docx");
        assert_eq!(file.file_size, 3);
        assert_eq!(file.uploaded_by, Some(actor));

        let view = f.svc.get(dep.id).await.unwrap();
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.service_name.as_deref(), Some("billing"));
        assert_eq!(f.svc.list_by_service(sid).await.unwrap().len(), 1);
        assert!(f.svc.list_by_service(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_create_removes_uploaded_file() {
        let f = fixture();
        let sid = f.repo.add_service("a");
        f.svc.create(input(sid, "1.0"), None).await.unwrap();

        let stored = f.svc.store().save("notes.pdf", b"pdf").await.unwrap();
        assert_eq!(files_in(&f.dir), 1);
        let err = f.svc.create_with_file(input(sid, "1.0"), Some(stored), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(files_in(&f.dir), 0);

        let stored = f.svc.store().save("notes.pdf", b"pdf").await.unwrap();
        let err = f.svc.create_with_file(input(sid, ""), Some(stored), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        assert_eq!(files_in(&f.dir), 0);
    }

    #[tokio::test]
    async fn attach_file_to_missing_deployment_discards_upload() {
        let f = fixture();
        let stored = f.svc.store().save("deck.pptx", b"ppt").await.unwrap();
        let err = f.svc.attach_file(Uuid::new_v4(), stored, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Deployment not found"));
        assert_eq!(files_in(&f.dir), 0);
    }

    #[tokio::test]
    async fn delete_removes_rows_and_stored_files() {
        let f = fixture();
        let sid = f.repo.add_service("a");
        let first = f.svc.store().save("a.pdf", b"1").await.unwrap();
        let (dep, file) = f.svc.create_with_file(input(sid, "1.0"), Some(first), None).await.unwrap();
        let second = f.svc.store().save("b.xls", b"2").await.unwrap();
        f.svc.attach_file(dep.id, second, None).await.unwrap();
        assert_eq!(files_in(&f.dir), 2);

        f.svc.delete(dep.id).await.unwrap();
        assert_eq!(files_in(&f.dir), 0);
        assert!(matches!(f.svc.get(dep.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.get_file(file.id).await, Err(ServiceError::NotFound(m)) if m == "File not found"));
        assert!(matches!(f.svc.delete(dep.id).await, Err(ServiceError::NotFound(_))));
    }
}
