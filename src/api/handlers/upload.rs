use crate::AppState;
use crate::api::error::AppError;
use crate::config::PHOTO_FIELD;
use crate::models::{LogEntry, UploadRecord};
use crate::services::storage::StagedPhoto;
use crate::utils::validation::{
    ValidationError, generated_filename, validate_file_count, validate_mime_type,
};
use axum::{
    Json,
    extract::{ConnectInfo, Multipart, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::TryStreamExt;
use std::net::SocketAddr;
use tokio_util::io::StreamReader;

use super::types::UploadResponse;

/// A part that passed validation and is waiting for the rest of the request
struct PendingPhoto {
    fieldname: String,
    originalname: String,
    saved_as: String,
    staged: StagedPhoto,
}

/// `POST /upload-photo`
///
/// Accepts up to `max_files` image parts under the `photos` field. Every part is
/// staged first; the request commits only when all parts have been accepted, so
/// a rejected request leaves no files behind. One log line is appended per
/// successful request.
pub async fn upload_photos(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let policy = state.config.error_status_policy;
    let ip = client_ip(&headers, peer, state.config.trust_proxy);

    let mut multipart = match multipart {
        Ok(multipart) => Some(multipart),
        Err(rejection) if is_multipart(&headers) => {
            tracing::warn!("Malformed multipart request from {}: {}", ip, rejection);
            return AppError::Multipart {
                message: rejection.body_text(),
                too_large: false,
            }
            .into_response_with(policy);
        }
        // Not a form upload at all: nothing to store
        Err(_) => None,
    };

    let deadline = state.config.request_timeout();
    let work = async {
        let mut pending: Vec<PendingPhoto> = Vec::new();

        if let Some(multipart) = multipart.as_mut() {
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::multipart(&e))?
            {
                // Parts without a filename are plain form fields
                let Some(originalname) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let fieldname = field.name().unwrap_or_default().to_string();

                // 1. Validate before touching the disk
                if fieldname != PHOTO_FIELD {
                    return Err(ValidationError::UnexpectedField { field: fieldname }.into());
                }
                validate_file_count(pending.len() + 1, state.config.max_files)?;
                validate_mime_type(field.content_type())?;

                // 2. Name it as of arrival
                let saved_as = generated_filename(&originalname, Utc::now().timestamp_millis());

                // 3. Stream to staging
                let reader = StreamReader::new(field.map_err(std::io::Error::other));
                let staged = state.storage.stage(reader).await?;

                tracing::debug!(
                    "Staged {} ({} bytes) as {}",
                    originalname,
                    staged.size(),
                    saved_as
                );
                pending.push(PendingPhoto {
                    fieldname,
                    originalname,
                    saved_as,
                    staged,
                });
            }
        }

        // 4. Every part accepted: give the staged files their final names
        let mut records = Vec::with_capacity(pending.len());
        for photo in pending {
            let stored = state.storage.commit(photo.staged, &photo.saved_as).await?;
            records.push(UploadRecord::new(&photo.fieldname, &photo.originalname, &stored));
        }
        Ok::<_, AppError>(records)
    };

    // Dropping the work future on timeout also drops the staged files
    let result: Result<Vec<UploadRecord>, AppError> =
        match tokio::time::timeout(deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout),
        };

    match result {
        Ok(records) => {
            let uploaded = records.len();
            let entry = LogEntry::new(Utc::now(), ip.clone(), records);
            if let Err(e) = state.upload_log.append(&entry).await {
                tracing::error!("Failed to append upload log for {}: {}", ip, e);
                return AppError::Io(e).into_response_with(policy);
            }

            tracing::info!("📸 Stored {} photo(s) from {}", uploaded, ip);
            (
                StatusCode::OK,
                Json(UploadResponse { ok: true, uploaded }),
            )
                .into_response()
        }
        Err(e) => {
            match &e {
                AppError::Validation(v) => tracing::warn!(
                    code = v.code(),
                    detail = ?v,
                    "Upload from {} rejected: {}",
                    ip,
                    e
                ),
                _ => tracing::warn!("Upload from {} rejected: {}", ip, e),
            }

            // Consume the remaining multipart stream so the client reads our error instead of a reset.
            // A stalled body is not waited on again.
            if !matches!(e, AppError::Timeout) {
                if let Some(multipart) = multipart.as_mut() {
                    let drain = async {
                        while let Ok(Some(mut field)) = multipart.next_field().await {
                            while let Ok(Some(_)) = field.chunk().await {}
                        }
                    };
                    if tokio::time::timeout(deadline, drain).await.is_err() {
                        tracing::warn!("Gave up consuming the request body from {}", ip);
                    }
                }
            }
            e.into_response_with(policy)
        }
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/"))
}

/// Peer address, or the left-most `X-Forwarded-For` hop when the proxy is trusted
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}
