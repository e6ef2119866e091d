use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.authorizer.authorize(req.headers()).await {
        return Ok(next.run(req).await);
    }

    tracing::warn!("🚫 Rejected unauthorized {} {}", req.method(), req.uri());
    Err(AppError::Unauthorized)
}
