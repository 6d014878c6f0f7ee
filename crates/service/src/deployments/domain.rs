use models::{deployment, deployment_file};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields accepted when recording a deployment (JSON body or multipart form).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeployment {
    pub service_id: Uuid,
    pub version: String,
    #[serde(default)]
    pub changes: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
}

/// Validated row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub service_id: Uuid,
    pub version: String,
    pub changes: Option<String>,
    pub branch_name: String,
    pub created_by: Option<Uuid>,
}

/// Metadata of a file already written to the upload directory.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    #[serde(flatten)]
    pub file: deployment_file::Model,
    pub uploader_email: Option<String>,
}

/// Deployment row joined with its service, creator and files.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentView {
    #[serde(flatten)]
    pub deployment: deployment::Model,
    pub service_name: Option<String>,
    pub application: Option<String>,
    pub creator_email: Option<String>,
    pub files: Vec<FileView>,
}
