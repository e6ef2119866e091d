#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use photo_upload_server::config::UploadConfig;
use photo_upload_server::services::authorizer::create_authorizer;
use photo_upload_server::services::storage::PhotoStorage;
use photo_upload_server::services::upload_log::{JsonlUploadLog, UploadLog};
use photo_upload_server::{AppState, create_app};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub app: Router,
    pub upload_dir: PathBuf,
    pub log_path: PathBuf,
    _tmp: TempDir,
}

pub async fn spawn_app(configure: impl FnOnce(&mut UploadConfig)) -> TestApp {
    spawn_app_with_log(configure, None).await
}

/// Builds the app over a fresh temp directory; `upload_log` replaces the JSONL sink when given
pub async fn spawn_app_with_log(
    configure: impl FnOnce(&mut UploadConfig),
    upload_log: Option<Arc<dyn UploadLog>>,
) -> TestApp {
    let tmp = tempfile::tempdir().unwrap();

    let mut config = UploadConfig {
        upload_dir: tmp.path().join("uploads"),
        log_path: tmp.path().join("upload_log.jsonl"),
        ..UploadConfig::default()
    };
    configure(&mut config);

    let storage = PhotoStorage::open(
        &config.upload_dir,
        config.max_file_size,
        config.verify_magic_bytes,
    )
    .await
    .unwrap();
    let upload_dir = storage.dir().to_path_buf();
    let log_path = config.log_path.clone();

    let state = AppState {
        storage: Arc::new(storage),
        upload_log: upload_log.unwrap_or_else(|| {
            Arc::new(JsonlUploadLog::new(&config.log_path)) as Arc<dyn UploadLog>
        }),
        authorizer: create_authorizer(config.upload_token.as_deref()).into(),
        config,
    };

    let app = create_app(state).layer(MockConnectInfo(SocketAddr::from((
        [127, 0, 0, 1],
        40000,
    ))));

    TestApp {
        app,
        upload_dir,
        log_path,
        _tmp: tmp,
    }
}

/// One part of a hand-built multipart body
pub struct Part {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn photo(filename: &str, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            field: "photos".to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data,
        }
    }

    pub fn text(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            filename: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

/// PNG signature followed by `len` filler bytes
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = PNG_HEADER.to_vec();
    data.resize(PNG_HEADER.len() + len, 0xAB);
    data
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match &part.filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.field),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-photo")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "response is not JSON ({e}): {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// Sorted names of everything in `dir`, staging files included
pub async fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}

/// Log lines parsed as JSON; empty when the log was never written
pub async fn log_lines(path: &Path) -> Vec<Value> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => panic!("failed to read log: {e}"),
    }
}

/// `<digits>_<rest>` split, or None when the timestamp prefix is missing
pub fn split_saved_name(saved_as: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = saved_as.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix, rest))
}
