//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the upload directory exists; warn when the optional static bundle is missing.
pub async fn ensure_env(static_dir: Option<&str>, upload_dir: &str) -> anyhow::Result<()> {
    if let Some(dir) = static_dir {
        if tokio::fs::metadata(dir).await.is_err() {
            warn!(%dir, "static assets directory not found; frontend routes will 404");
        }
    }
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {upload_dir}: {e}"))?;
    Ok(())
}
