//! Submitted content, validation and hashing
//!
//! The content hash is the Keccak-256 digest of the canonical string form,
//! hex encoded with a `0x` prefix. Images hash through their data URI so the
//! digest matches records written by other clients of the same contract.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha3::{Digest, Keccak256};
use thiserror::Error;
use url::Url;

use crate::ContentType;

/// Placeholder stored in history instead of image bytes
pub const IMAGE_PLACEHOLDER: &str = "[IMAGE DATA]";

/// Maximum characters of text/URL content kept in history
pub const HISTORY_CONTENT_LIMIT: usize = 150;

/// Errors from content handling
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content is empty")]
    Empty,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),
}

/// Raw image bytes with their mime type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.to_string(),
            bytes,
        }
    }

    /// Build from bytes, guessing the mime type from the magic number
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ContentError> {
        let mime = guess_image_mime(&bytes)
            .ok_or_else(|| ContentError::InvalidImage("unrecognized image format".to_string()))?;
        Ok(Self::new(mime, bytes))
    }

    /// Parse a `data:image/...;base64,...` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, ContentError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ContentError::InvalidImage("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ContentError::InvalidImage("missing payload".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ContentError::InvalidImage("payload is not base64".to_string()))?;
        if !mime.starts_with("image/") {
            return Err(ContentError::InvalidImage(format!("not an image type: {}", mime)));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ContentError::InvalidImage(e.to_string()))?;
        Ok(Self::new(mime, bytes))
    }

    /// Base64 payload without the URI header
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

/// Detect common image formats from their leading bytes
pub fn guess_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// A piece of content submitted for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Url(String),
    Image(ImageData),
}

impl Content {
    pub fn content_type(&self) -> ContentType {
        match self {
            Content::Text(_) => ContentType::Text,
            Content::Url(_) => ContentType::Url,
            Content::Image(_) => ContentType::Image,
        }
    }

    /// String form used for hashing
    pub fn canonical(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Url(url) => url.clone(),
            Content::Image(image) => image.to_data_uri(),
        }
    }

    /// Check the content is well-formed for its type
    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            Content::Text(text) => {
                if text.trim().is_empty() {
                    return Err(ContentError::Empty);
                }
            }
            Content::Url(url) => {
                Url::parse(url.trim()).map_err(|e| ContentError::InvalidUrl(e.to_string()))?;
            }
            Content::Image(image) => {
                if !image.mime.starts_with("image/") {
                    return Err(ContentError::InvalidImage(format!(
                        "not an image type: {}",
                        image.mime
                    )));
                }
                if image.bytes.is_empty() {
                    return Err(ContentError::Empty);
                }
            }
        }
        Ok(())
    }

    /// Keccak-256 digest of the canonical form
    pub fn hash(&self) -> String {
        content_hash(&self.canonical())
    }

    /// Shortened form kept in local history
    pub fn history_excerpt(&self) -> String {
        match self {
            Content::Image(_) => IMAGE_PLACEHOLDER.to_string(),
            Content::Text(s) | Content::Url(s) => truncate_text(s, HISTORY_CONTENT_LIMIT),
        }
    }
}

/// Keccak-256 of the UTF-8 bytes, `0x`-prefixed hex
pub fn content_hash(content: &str) -> String {
    let digest = Keccak256::digest(content.as_bytes());
    format!("0x{}", hex::encode(digest))
}

/// Truncate to `max_chars` characters, appending "..." when cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_empty() {
        assert_eq!(
            content_hash(""),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = Content::Text("hello".to_string()).hash();
        let b = Content::Text("hello".to_string()).hash();
        assert_eq!(a, b);
        assert_eq!(a.len(), 66);
        assert_ne!(a, Content::Text("hello!".to_string()).hash());
    }

    #[test]
    fn test_validate() {
        assert!(Content::Text("  ".to_string()).validate().is_err());
        assert!(Content::Text("claim".to_string()).validate().is_ok());
        assert!(Content::Url("not a url".to_string()).validate().is_err());
        assert!(Content::Url("https://example.com".to_string()).validate().is_ok());
        assert!(Content::Image(ImageData::new("text/plain", vec![1])).validate().is_err());
    }

    #[test]
    fn test_data_uri_round_trip() {
        let image = ImageData::new("image/png", vec![0x89, b'P', b'N', b'G']);
        let uri = image.to_data_uri();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        assert_eq!(ImageData::from_data_uri(&uri).unwrap(), image);
    }

    #[test]
    fn test_data_uri_rejects_non_images() {
        assert!(ImageData::from_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(ImageData::from_data_uri("image/png;base64,aGk=").is_err());
        assert!(ImageData::from_data_uri("data:image/png,raw").is_err());
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_image_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(guess_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert!(ImageData::from_bytes(b"hello".to_vec()).is_err());
    }

    #[test]
    fn test_history_excerpt() {
        let long = "a".repeat(200);
        let excerpt = Content::Text(long).history_excerpt();
        assert_eq!(excerpt.len(), 153);
        assert!(excerpt.ends_with("..."));

        let image = Content::Image(ImageData::new("image/png", vec![1, 2, 3]));
        assert_eq!(image.history_excerpt(), IMAGE_PLACEHOLDER);
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
