use crate::config::UploadConfig;
use crate::services::authorizer::{UploadAuthorizer, create_authorizer};
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup_authorizer(config: &UploadConfig) -> Arc<dyn UploadAuthorizer> {
    if config.upload_token.is_some() {
        info!("🔐 Uploads require a bearer token");
    } else {
        warn!("⚠️  UPLOAD_TOKEN not set, accepting anonymous uploads");
    }

    create_authorizer(config.upload_token.as_deref()).into()
}
