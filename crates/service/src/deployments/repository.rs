use async_trait::async_trait;
use models::{deployment, deployment_file};
use uuid::Uuid;

use super::domain::{DeploymentView, NewDeployment, NewFile};
use crate::errors::ServiceError;

pub const VERSION_CONFLICT: &str = "Version already exists for this service";

/// Persistence for deployments and their files.
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn service_exists(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn version_exists(&self, service_id: Uuid, version: &str) -> Result<bool, ServiceError>;
    async fn deployment_exists(&self, id: Uuid) -> Result<bool, ServiceError>;

    /// Insert the deployment and, when given, its first file in one transaction.
    /// A duplicate `(service_id, version)` yields `Conflict`.
    async fn insert(
        &self,
        new: NewDeployment,
        file: Option<NewFile>,
    ) -> Result<(deployment::Model, Option<deployment_file::Model>), ServiceError>;
    async fn insert_file(&self, deployment_id: Uuid, file: NewFile) -> Result<deployment_file::Model, ServiceError>;

    /// Newest first; all services when `service_id` is `None`.
    async fn list(&self, service_id: Option<Uuid>) -> Result<Vec<DeploymentView>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<DeploymentView>, ServiceError>;
    async fn get_file(&self, file_id: Uuid) -> Result<Option<deployment_file::Model>, ServiceError>;

    /// Delete file rows, then the deployment. Returns the stored paths of the
    /// removed files, or `None` when the deployment does not exist.
    async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>, ServiceError>;
}

/// In-memory repository for service-layer tests
pub mod mock {
    use super::*;
    use crate::deployments::domain::FileView;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockDeploymentRepository {
        services: Mutex<HashMap<Uuid, String>>,
        deployments: Mutex<Vec<deployment::Model>>,
        files: Mutex<Vec<deployment_file::Model>>,
    }

    impl MockDeploymentRepository {
        /// Register a service and return its id.
        pub fn add_service(&self, name: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.services.lock().unwrap().insert(id, name.to_string());
            id
        }

        fn file_row(deployment_id: Uuid, file: NewFile) -> deployment_file::Model {
            deployment_file::Model {
                id: Uuid::new_v4(),
                deployment_id,
                file_name: file.file_name,
                file_path: file.file_path,
                file_type: file.file_type,
                file_size: file.file_size,
                uploaded_by: file.uploaded_by,
                uploaded_at: Utc::now().into(),
            }
        }

        fn view(&self, d: &deployment::Model) -> DeploymentView {
            let files = self
                .files
                .lock()
                .unwrap()
                .iter()
                .filter(|f| f.deployment_id == d.id)
                .cloned()
                .map(|file| FileView { file, uploader_email: None })
                .collect();
            DeploymentView {
                deployment: d.clone(),
                service_name: self.services.lock().unwrap().get(&d.service_id).cloned(),
                application: None,
                creator_email: None,
                files,
            }
        }
    }

    #[async_trait]
    impl DeploymentRepository for MockDeploymentRepository {
        async fn service_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
            Ok(self.services.lock().unwrap().contains_key(&id))
        }

        async fn version_exists(&self, service_id: Uuid, version: &str) -> Result<bool, ServiceError> {
            let deployments = self.deployments.lock().unwrap();
            Ok(deployments.iter().any(|d| d.service_id == service_id && d.version == version))
        }

        async fn deployment_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
            Ok(self.deployments.lock().unwrap().iter().any(|d| d.id == id))
        }

        async fn insert(
            &self,
            new: NewDeployment,
            file: Option<NewFile>,
        ) -> Result<(deployment::Model, Option<deployment_file::Model>), ServiceError> {
            let mut deployments = self.deployments.lock().unwrap();
            if deployments.iter().any(|d| d.service_id == new.service_id && d.version == new.version) {
                return Err(ServiceError::Conflict(VERSION_CONFLICT.into()));
            }
            let row = deployment::Model {
                id: Uuid::new_v4(),
                service_id: new.service_id,
                version: new.version,
                changes: new.changes,
                branch_name: new.branch_name,
                created_by: new.created_by,
                created_at: Utc::now().into(),
            };
            deployments.push(row.clone());
            let file_row = file.map(|f| Self::file_row(row.id, f));
            if let Some(f) = &file_row {
                self.files.lock().unwrap().push(f.clone());
            }
            Ok((row, file_row))
        }

        async fn insert_file(&self, deployment_id: Uuid, file: NewFile) -> Result<deployment_file::Model, ServiceError> {
            let row = Self::file_row(deployment_id, file);
            self.files.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list(&self, service_id: Option<Uuid>) -> Result<Vec<DeploymentView>, ServiceError> {
            let mut rows: Vec<deployment::Model> = self
                .deployments
                .lock()
                .unwrap()
                .iter()
                .filter(|d| service_id.map_or(true, |s| d.service_id == s))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows.iter().map(|d| self.view(d)).collect())
        }

        async fn get(&self, id: Uuid) -> Result<Option<DeploymentView>, ServiceError> {
            let found = self.deployments.lock().unwrap().iter().find(|d| d.id == id).cloned();
            Ok(found.map(|d| self.view(&d)))
        }

        async fn get_file(&self, file_id: Uuid) -> Result<Option<deployment_file::Model>, ServiceError> {
            Ok(self.files.lock().unwrap().iter().find(|f| f.id == file_id).cloned())
        }

        async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>, ServiceError> {
            let mut deployments = self.deployments.lock().unwrap();
            let Some(pos) = deployments.iter().position(|d| d.id == id) else {
                return Ok(None);
            };
            let mut files = self.files.lock().unwrap();
            let paths = files.iter().filter(|f| f.deployment_id == id).map(|f| f.file_path.clone()).collect();
            files.retain(|f| f.deployment_id != id);
            deployments.remove(pos);
            Ok(Some(paths))
        }
    }
}
