use crate::config::UploadConfig;
use crate::services::storage::PhotoStorage;
use crate::services::upload_log::{JsonlUploadLog, UploadLog};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage(config: &UploadConfig) -> anyhow::Result<Arc<PhotoStorage>> {
    let storage = PhotoStorage::open(
        &config.upload_dir,
        config.max_file_size,
        config.verify_magic_bytes,
    )
    .await
    .with_context(|| {
        format!(
            "failed to prepare upload directory {}",
            config.upload_dir.display()
        )
    })?;

    info!("📁 Upload directory: {}", storage.dir().display());

    match storage.sweep_staging().await {
        Ok(0) => {}
        Ok(n) => info!("🧹 Removed {} leftover staging file(s)", n),
        Err(e) => warn!("⚠️  Could not sweep staging files: {}", e),
    }

    Ok(Arc::new(storage))
}

pub fn setup_upload_log(config: &UploadConfig) -> Arc<dyn UploadLog> {
    info!("📝 Upload log: {}", config.log_path.display());
    Arc::new(JsonlUploadLog::new(&config.log_path))
}
