//! Profile image checks and on-disk storage.

use std::path::PathBuf;

use bytes::Bytes;
use rand::Rng;
use thiserror::Error;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];
const SUSPICIOUS_PATTERNS: [&str; 6] = [".php", ".js", ".html", ".exe", ".bat", ".cmd"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File too large. Maximum size is 5MB")]
    TooLarge,

    #[error("Invalid file type. Only JPEG, PNG, and WebP images are allowed")]
    InvalidType,

    #[error("Invalid file extension. Only .jpg, .jpeg, .png, and .webp files are allowed")]
    InvalidExtension,

    #[error("Suspicious file detected")]
    Suspicious,

    #[error("File content does not match its declared type")]
    SignatureMismatch,

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Whether `bytes` starts with this format's magic number.
    pub fn matches_signature(self, bytes: &[u8]) -> bool {
        match self {
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Png => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Self::Webp => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        }
    }
}

/// An image body as received, before any checks.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub body: Bytes,
}

/// Run every acceptance rule and return the detected kind plus the name the
/// file should be stored under (before uniquifying).
pub fn check_upload(upload: &ImageUpload) -> Result<(ImageKind, String), UploadError> {
    if upload.body.is_empty() {
        return Err(UploadError::NoFile);
    }
    if upload.body.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }

    let kind = upload
        .content_type
        .as_deref()
        .and_then(ImageKind::from_content_type)
        .ok_or(UploadError::InvalidType)?;

    let name = match upload.file_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("image.{}", kind.extension()),
    };
    let lowered = name.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
        return Err(UploadError::InvalidExtension);
    }
    if SUSPICIOUS_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        return Err(UploadError::Suspicious);
    }

    if !kind.matches_signature(&upload.body) {
        return Err(UploadError::SignatureMismatch);
    }

    Ok((kind, sanitize_file_name(&name)))
}

/// Replace everything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory holding uploaded images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Validate and write `upload`, returning the stored file name.
    pub async fn save(&self, upload: ImageUpload) -> Result<String, UploadError> {
        let (_, sanitized) = check_upload(&upload)?;
        let stored = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            rand::thread_rng().gen_range(0..=1_000_000_000u32),
            sanitized
        );

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored), &upload.body).await?;
        tracing::info!(file = %stored, bytes = upload.body.len(), "Stored uploaded image");
        Ok(stored)
    }

    /// Resolve a stored file name, refusing anything that is not a plain
    /// file name inside the upload directory.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let plain = !file_name.is_empty()
            && !file_name.starts_with('.')
            && !file_name.contains(['/', '\\'])
            && !file_name.contains("..");
        plain.then(|| self.dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16];

    fn upload(content_type: &str, name: Option<&str>, body: &[u8]) -> ImageUpload {
        ImageUpload {
            content_type: Some(content_type.to_string()),
            file_name: name.map(str::to_string),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn accepts_matching_png() {
        let (kind, name) = check_upload(&upload("image/png", Some("my photo.png"), PNG)).unwrap();
        assert_eq!(kind, ImageKind::Png);
        assert_eq!(name, "my_photo.png");
    }

    #[test]
    fn defaults_name_from_type() {
        let (_, name) = check_upload(&upload("image/jpeg", None, JPEG)).unwrap();
        assert_eq!(name, "image.jpg");
    }

    #[test]
    fn webp_signature_checks_riff_header() {
        let mut body = b"RIFF\x10\x00\x00\x00WEBPVP8 ".to_vec();
        body.extend_from_slice(&[0; 8]);
        assert!(check_upload(&upload("image/webp", Some("a.webp"), &body)).is_ok());
        assert!(!ImageKind::Webp.matches_signature(b"RIFF\x10\x00\x00\x00WAVE"));
    }

    #[test]
    fn rejects_each_rule() {
        let cases = [
            (upload("image/png", Some("a.png"), b""), "No file uploaded"),
            (
                upload("image/gif", Some("a.gif"), b"GIF89a"),
                "Invalid file type. Only JPEG, PNG, and WebP images are allowed",
            ),
            (
                upload("image/png", Some("a.txt"), PNG),
                "Invalid file extension. Only .jpg, .jpeg, .png, and .webp files are allowed",
            ),
            (
                upload("image/png", Some("shell.php.png"), PNG),
                "Suspicious file detected",
            ),
            (
                upload("image/png", Some("a.png"), JPEG),
                "File content does not match its declared type",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(check_upload(&input).unwrap_err().to_string(), expected);
        }
    }

    #[test]
    fn rejects_oversized_body() {
        let mut body = PNG.to_vec();
        body.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = check_upload(&upload("image/png", Some("a.png"), &body)).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge));
    }

    #[test]
    fn missing_content_type_is_invalid_type() {
        let input = ImageUpload {
            content_type: None,
            file_name: None,
            body: Bytes::from_static(PNG),
        };
        assert!(matches!(check_upload(&input), Err(UploadError::InvalidType)));
    }

    #[tokio::test]
    async fn save_writes_uniquely_named_file() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let stored = store
            .save(upload("image/png", Some("avatar.png"), PNG))
            .await
            .unwrap();

        assert!(stored.ends_with("-avatar.png"));
        assert_eq!(stored.split('-').count(), 3);
        let written = std::fs::read(dir.path().join("uploads").join(&stored)).unwrap();
        assert_eq!(written, PNG);
    }

    #[test]
    fn resolve_refuses_traversal() {
        let store = UploadStore::new("uploads");
        assert!(store.resolve("1-2-a.png").is_some());
        assert!(store.resolve("../secret").is_none());
        assert!(store.resolve(".env").is_none());
        assert!(store.resolve("a/b.png").is_none());
        assert!(store.resolve("").is_none());
    }
}
