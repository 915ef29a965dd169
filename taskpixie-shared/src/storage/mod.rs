/// Object storage for uploaded files (user avatars)
///
/// Objects are addressed by flat keys of the form `{uuid}.{ext}`. Callers never
/// choose the key: [`FileStore::upload`] generates it from the sniffed image
/// format, and every key coming back from a client goes through
/// [`validate_key`] before it reaches a backend.
///
/// Accepted formats: PNG, JPEG and WebP, at most [`MAX_AVATAR_BYTES`].

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{DomainError, DomainResult};

pub mod local;

pub use local::LocalFileStore;

/// 2 MiB
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Identifies the format from the file's magic bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// An object read back from the store
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: &'static str,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores an avatar image and returns its generated key
    async fn upload(&self, data: Bytes) -> DomainResult<String>;

    async fn get(&self, key: &str) -> DomainResult<StoredObject>;

    /// Deletes an object; a key that is already gone is not an error
    async fn remove(&self, key: &str) -> DomainResult<()>;
}

/// Checks size and format of an avatar upload
pub fn validate_avatar(data: &[u8]) -> DomainResult<ImageFormat> {
    if data.is_empty() {
        return Err(DomainError::invalid_field("avatar", "Avatar file is empty"));
    }
    if data.len() > MAX_AVATAR_BYTES {
        return Err(DomainError::invalid_field("avatar", "Avatar must be at most 2 MiB"));
    }
    ImageFormat::sniff(data).ok_or_else(|| {
        DomainError::invalid_field("avatar", "Avatar must be a PNG, JPEG or WebP image")
    })
}

/// Rejects keys that could escape the store's namespace and returns the format
/// implied by the extension
pub fn validate_key(key: &str) -> DomainResult<ImageFormat> {
    let invalid = || DomainError::NotFound(format!("Object '{}' not found", key));

    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(invalid());
    }

    let (stem, ext) = key.rsplit_once('.').ok_or_else(invalid)?;
    if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid());
    }

    ImageFormat::from_extension(ext).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn test_sniff() {
        assert_eq!(ImageFormat::sniff(PNG), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(JPEG), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(WEBP), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[test]
    fn test_validate_avatar() {
        assert_eq!(validate_avatar(PNG).unwrap(), ImageFormat::Png);
        assert!(matches!(validate_avatar(b""), Err(DomainError::ValidationFailed(_))));
        assert!(matches!(validate_avatar(b"plain text"), Err(DomainError::ValidationFailed(_))));

        let mut too_big = PNG.to_vec();
        too_big.resize(MAX_AVATAR_BYTES + 1, 0);
        assert!(matches!(validate_avatar(&too_big), Err(DomainError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_key_accepts_generated_keys() {
        let key = format!("{}.png", uuid::Uuid::new_v4());
        assert_eq!(validate_key(&key).unwrap(), ImageFormat::Png);
        assert_eq!(validate_key("abc-123.JPG").unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in [
            "",
            "../etc/passwd",
            "..png",
            "a/b.png",
            "a\\b.png",
            ".png",
            "noext",
            "file.exe",
            "name with space.png",
        ] {
            assert!(validate_key(key).is_err(), "{key:?} should be rejected");
        }
    }
}
