use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, ScripterError};

/// Size above which a reference image is unusually large for the video model
const RECOMMENDED_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Character reference image, read once and shared read-only by every job
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Base64 form embedded in API requests
    pub encoded: String,
}

/// The character every scene is about
#[derive(Debug, Clone, Default)]
pub struct CharacterProfile {
    pub description: String,
    pub image: Option<Arc<ReferenceImage>>,
}

/// Read an image file and encode it for transport
pub async fn encode_image<P: AsRef<Path>>(path: P) -> Result<ReferenceImage> {
    let path = path.as_ref();
    let read_error = |reason: String| ScripterError::Read {
        path: path.display().to_string(),
        reason,
    };

    let bytes = fs::read(path).await.map_err(|e| read_error(e.to_string()))?;
    if bytes.is_empty() {
        return Err(read_error("file is empty".to_string()));
    }

    if bytes.len() > RECOMMENDED_MAX_BYTES {
        warn!(
            "Reference image {} is {:.1} MB; large images may be rejected",
            path.display(),
            bytes.len() as f64 / 1024.0 / 1024.0
        );
    }

    let mime_type = detect_mime_type(&bytes, path).to_string();
    let encoded = STANDARD.encode(&bytes);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Encoded {} ({} bytes, {})", file_name, bytes.len(), mime_type);
    info!("Loaded reference image {}", path.display());

    Ok(ReferenceImage {
        file_name,
        mime_type,
        bytes,
        encoded,
    })
}

/// Sniff the file signature, falling back to the extension
fn detect_mime_type(bytes: &[u8], path: &Path) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return "image/png";
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// File extension matching a MIME type, used when saving fetched media
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[tokio::test]
    async fn test_encode_png() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("hero.png");
        file.write_binary(PNG_HEADER).unwrap();

        let image = encode_image(file.path()).await.unwrap();
        assert_eq!(image.file_name, "hero.png");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, PNG_HEADER);
        assert_eq!(STANDARD.decode(&image.encoded).unwrap(), PNG_HEADER);
    }

    #[tokio::test]
    async fn test_signature_wins_over_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("hero.png");
        file.write_binary(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();

        let image = encode_image(file.path()).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_extension_fallback() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("hero.JPEG");
        file.write_binary(b"not really a jpeg").unwrap();

        let image = encode_image(file.path()).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = encode_image(temp.path().join("absent.png")).await;
        assert!(matches!(result, Err(ScripterError::Read { .. })));
    }

    #[tokio::test]
    async fn test_empty_file_is_read_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("empty.png");
        file.touch().unwrap();

        let result = encode_image(file.path()).await;
        assert!(matches!(result, Err(ScripterError::Read { .. })));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("video/mp4"), "mp4");
        assert_eq!(extension_for_mime("text/plain"), "bin");
    }
}
