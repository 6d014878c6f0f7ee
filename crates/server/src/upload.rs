//! Multipart form handling for deployment documentation uploads.

use std::collections::HashMap;

use axum::extract::Multipart;
use service::deployments::domain::CreateDeployment;
use service::storage::{LocalFileStore, StoredFile};
use uuid::Uuid;

use crate::errors::JsonApiError;

pub const FILE_FIELD: &str = "file";

/// Text fields plus the streamed file, if one was sent.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<StoredFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// `serviceId`, `version`, `changes`, `branchName`.
    pub fn deployment_input(&self) -> Result<CreateDeployment, JsonApiError> {
        let service_id = self
            .text("serviceId")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| JsonApiError::bad_request("serviceId required"))?;
        let service_id = Uuid::parse_str(service_id).map_err(|_| JsonApiError::bad_request("Invalid serviceId"))?;
        Ok(CreateDeployment {
            service_id,
            version: self.text("version").unwrap_or_default().to_string(),
            changes: self.text("changes").map(str::to_string),
            branch_name: self.text("branchName").map(str::to_string),
        })
    }

    /// Remove the stored file, if any.
    pub async fn discard(self, store: &LocalFileStore) {
        if let Some(f) = self.file {
            store.remove_all([f.path]).await;
        }
    }
}

/// Read every field, streaming the first `file` part into `store`.
///
/// On error nothing stays on disk.
pub async fn read_form(store: &LocalFileStore, multipart: Multipart) -> Result<UploadForm, JsonApiError> {
    let mut form = UploadForm::default();
    match read_fields(store, multipart, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard(store).await;
            Err(e)
        }
    }
}

async fn read_fields(store: &LocalFileStore, mut multipart: Multipart, form: &mut UploadForm) -> Result<(), JsonApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name != FILE_FIELD {
            let value = field.text().await?;
            form.fields.insert(name, value);
            continue;
        }
        // Browsers send an empty part when no file was picked
        let Some(file_name) = field.file_name().map(str::to_string).filter(|n| !n.is_empty()) else {
            continue;
        };
        if form.file.is_some() {
            continue;
        }
        let mut upload = store.begin(&file_name).await?;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    upload.abort().await;
                    return Err(e.into());
                }
            };
            if let Err(e) = upload.write_chunk(&chunk).await {
                upload.abort().await;
                return Err(e.into());
            }
        }
        form.file = Some(upload.finish().await?);
    }
    Ok(())
}
