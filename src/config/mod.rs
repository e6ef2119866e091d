use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Multipart field that carries the photos
pub const PHOTO_FIELD: &str = "photos";

/// Route the upload handler is mounted on
pub const UPLOAD_ROUTE: &str = "/upload-photo";

/// Extra room on top of the file payload for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024; // 10 MB

/// How failures are mapped onto HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStatusPolicy {
    /// Every failure is a 500, validation included
    #[default]
    ServerError,
    /// Validation failures become 4xx, I/O failures stay 500
    Split,
}

impl ErrorStatusPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "server_error" | "500" => Some(Self::ServerError),
            "split" => Some(Self::Split),
            _ => None,
        }
    }
}

/// Upload endpoint configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory accepted photos are written to (default: "uploads")
    pub upload_dir: PathBuf,

    /// Append-only JSON lines log (default: "upload_log.jsonl")
    pub log_path: PathBuf,

    /// Maximum number of file parts per request (default: 6)
    pub max_files: usize,

    /// Maximum size of a single part in bytes (default: 15 MB)
    pub max_file_size: usize,

    /// Bearer token required on uploads; anonymous uploads when unset
    pub upload_token: Option<String>,

    /// Resolve the client IP from X-Forwarded-For (default: false)
    pub trust_proxy: bool,

    /// Reject parts whose leading bytes identify a non-image type (default: false)
    pub verify_magic_bytes: bool,

    pub error_status_policy: ErrorStatusPolicy,

    /// Per-request timeout in seconds (default: 300)
    pub request_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            log_path: PathBuf::from("upload_log.jsonl"),
            max_files: 6,
            max_file_size: 15 * 1024 * 1024, // 15 MB
            upload_token: None,
            trust_proxy: false,
            verify_magic_bytes: false,
            error_status_policy: ErrorStatusPolicy::ServerError,
            request_timeout_secs: 300,
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            log_path: env::var("UPLOAD_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.log_path),

            max_files: env::var("MAX_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            upload_token: env::var("UPLOAD_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            trust_proxy: env::var("TRUST_PROXY")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.trust_proxy),

            verify_magic_bytes: env::var("VERIFY_MAGIC_BYTES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.verify_magic_bytes),

            error_status_policy: env::var("ERROR_STATUS_POLICY")
                .ok()
                .and_then(|v| ErrorStatusPolicy::parse(&v))
                .unwrap_or(default.error_status_policy),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),
        }
    }

    /// Body limit for the upload route: every allowed part at full size plus multipart overhead
    pub fn max_body_size(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(MULTIPART_OVERHEAD)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
