use thiserror::Error;

/// Declared content types must carry this prefix
const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only images allowed")]
    NotAnImage { mime_type: String },

    #[error("File too large")]
    FileTooLarge { max_size: usize },

    #[error("Too many files")]
    TooManyFiles { max_files: usize },

    #[error("Unexpected field")]
    UnexpectedField { field: String },

    #[error("File content is not an image")]
    ContentMismatch { detected: String },
}

impl ValidationError {
    /// Stable machine-readable code, logged with rejected uploads
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAnImage { .. } => "INVALID_MIME_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::TooManyFiles { .. } => "TOO_MANY_FILES",
            Self::UnexpectedField { .. } => "UNEXPECTED_FIELD",
            Self::ContentMismatch { .. } => "CONTENT_MISMATCH",
        }
    }
}

/// Validates the declared content type of a part. The check is a case-insensitive
/// prefix match on what the client sent; nothing about the bytes is implied.
pub fn validate_mime_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let is_image = |mime: &str| {
        mime.get(..IMAGE_MIME_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IMAGE_MIME_PREFIX))
    };
    match content_type {
        Some(mime) if is_image(mime) => Ok(()),
        other => Err(ValidationError::NotAnImage {
            mime_type: other.unwrap_or_default().to_string(),
        }),
    }
}

/// Validates the running byte count of a part against the per-file limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError::FileTooLarge { max_size });
    }
    Ok(())
}

/// Validates that the `count`-th file part (1-based) is still within the limit
pub fn validate_file_count(count: usize, max_files: usize) -> Result<(), ValidationError> {
    if count > max_files {
        return Err(ValidationError::TooManyFiles { max_files });
    }
    Ok(())
}

/// Rejects parts whose leading bytes carry a known signature of a non-image type.
/// Unrecognized content passes: SVG and friends have no magic bytes.
pub fn verify_magic_bytes(header: &[u8]) -> Result<(), ValidationError> {
    match infer::get(header) {
        Some(kind) if kind.matcher_type() != infer::MatcherType::Image => {
            Err(ValidationError::ContentMismatch {
                detected: kind.mime_type().to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Replaces every character outside `[A-Za-z0-9.\-_]` with `_`.
///
/// Characters outside the Basic Multilingual Plane become two underscores, one
/// per UTF-16 code unit, so names match what browser-side tooling computes.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len());
    for c in filename.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            sanitized.push(c);
        } else {
            for _ in 0..c.len_utf16() {
                sanitized.push('_');
            }
        }
    }
    sanitized
}

/// Name a part is stored under: `<unix millis>_<sanitized original name>`
pub fn generated_filename(original: &str, unix_millis: i64) -> String {
    format!("{}_{}", unix_millis, sanitize_filename(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mime_type() {
        assert!(validate_mime_type(Some("image/jpeg")).is_ok());
        assert!(validate_mime_type(Some("image/png")).is_ok());
        assert!(validate_mime_type(Some("image/svg+xml")).is_ok());

        assert_eq!(
            validate_mime_type(Some("text/plain")),
            Err(ValidationError::NotAnImage {
                mime_type: "text/plain".to_string()
            })
        );
        assert!(validate_mime_type(Some("application/octet-stream")).is_err());
        assert!(validate_mime_type(Some("imagex/png")).is_err());
        assert!(validate_mime_type(Some("IMAGE/PNG")).is_ok());
        assert!(validate_mime_type(Some("Image/Jpeg")).is_ok());
        assert!(validate_mime_type(Some("IMAGEX/PNG")).is_err());
        assert!(validate_mime_type(Some("imag")).is_err());
        assert!(validate_mime_type(Some("ímage/png")).is_err());
        assert!(validate_mime_type(None).is_err());
    }

    #[test]
    fn test_error_codes() {
        let cases = [
            (
                ValidationError::NotAnImage {
                    mime_type: "text/plain".into(),
                },
                "INVALID_MIME_TYPE",
            ),
            (ValidationError::FileTooLarge { max_size: 1 }, "FILE_TOO_LARGE"),
            (ValidationError::TooManyFiles { max_files: 6 }, "TOO_MANY_FILES"),
            (
                ValidationError::UnexpectedField {
                    field: "avatar".into(),
                },
                "UNEXPECTED_FIELD",
            ),
            (
                ValidationError::ContentMismatch {
                    detected: "application/pdf".into(),
                },
                "CONTENT_MISMATCH",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_validate_file_size() {
        let max = 15 * 1024 * 1024;
        assert!(validate_file_size(0, max).is_ok());
        assert!(validate_file_size(max, max).is_ok());
        assert_eq!(
            validate_file_size(max + 1, max),
            Err(ValidationError::FileTooLarge { max_size: max })
        );
    }

    #[test]
    fn test_validate_file_count() {
        assert!(validate_file_count(1, 6).is_ok());
        assert!(validate_file_count(6, 6).is_ok());
        assert!(validate_file_count(7, 6).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("my-photo_01.PNG"), "my-photo_01.PNG");
        assert_eq!(sanitize_filename("a b/c*.png"), "a_b_c_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("C:\\temp\\x.gif"), "C__temp_x.gif");
        assert_eq!(sanitize_filename("café.png"), "caf_.png");
        assert_eq!(sanitize_filename("😀.png"), "__.png");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_generated_filename() {
        assert_eq!(
            generated_filename("a b/c*.png", 1_700_000_000_123),
            "1700000000123_a_b_c_.png"
        );
        assert_eq!(generated_filename("", 42), "42_");
    }

    #[test]
    fn test_verify_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert!(verify_magic_bytes(&png).is_ok());
        assert!(verify_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).is_ok());

        // Unknown content (e.g. SVG text) is let through
        assert!(verify_magic_bytes(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>").is_ok());
        assert!(verify_magic_bytes(&[]).is_ok());

        let err = verify_magic_bytes(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n").unwrap_err();
        assert_eq!(err.code(), "CONTENT_MISMATCH");
        assert!(verify_magic_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00]).is_err());
    }
}
