pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::{UPLOAD_ROUTE, UploadConfig};
use crate::services::authorizer::UploadAuthorizer;
use crate::services::storage::PhotoStorage;
use crate::services::upload_log::UploadLog;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::post,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<PhotoStorage>,
    pub upload_log: Arc<dyn UploadLog>,
    pub authorizer: Arc<dyn UploadAuthorizer>,
    pub config: UploadConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            UPLOAD_ROUTE,
            post(api::handlers::upload::upload_photos)
                .layer(DefaultBodyLimit::max(state.config.max_body_size()))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(from_fn(api::middleware::security::security_headers))
        .with_state(state)
}
