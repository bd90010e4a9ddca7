//! Photo normalization for committed hunt evidence.
//!
//! The platform picker hands over raw image bytes. Before a photo can mark an
//! item found it must be recognized as a supported image container; anything
//! else is rejected without touching session state. Bytes are kept as-is, no
//! re-encoding happens here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    FTYP_BOX, GIF87_SIGNATURE, GIF89_SIGNATURE, HEIF_BRANDS, JPEG_EOI, JPEG_SOI, PNG_IEND,
    PNG_SIGNATURE, RIFF_SIGNATURE, WEBP_FOURCC,
};

/// Image container detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFormat {
    Jpeg,
    Png,
    Gif,
    Heic,
    Webp,
}

impl fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::Gif => write!(f, "gif"),
            Self::Heic => write!(f, "heic"),
            Self::Webp => write!(f, "webp"),
        }
    }
}

/// Reasons a picked image cannot be used as evidence.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoError {
    #[error("photo contained no data")]
    Empty,
    #[error("photo is not a recognized image format")]
    UnrecognizedFormat,
    #[error("{0} photo is truncated")]
    Truncated(PhotoFormat),
}

/// Normalized photo attached to a found item.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    format: PhotoFormat,
    fingerprint: String,
    bytes: Vec<u8>,
}

impl Photo {
    #[must_use]
    pub const fn format(&self) -> PhotoFormat {
        self.format
    }

    /// Hex-encoded SHA-256 of the photo bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Recognize and validate raw picker bytes.
///
/// # Errors
///
/// Returns [`PhotoError::Empty`] for zero-length input,
/// [`PhotoError::UnrecognizedFormat`] when no supported signature matches, and
/// [`PhotoError::Truncated`] when a JPEG or PNG is missing its end marker.
pub fn normalize_photo(raw: impl Into<Vec<u8>>) -> Result<Photo, PhotoError> {
    let bytes = raw.into();
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    let format = detect_format(&bytes).ok_or(PhotoError::UnrecognizedFormat)?;
    if !is_complete(format, &bytes) {
        return Err(PhotoError::Truncated(format));
    }
    Ok(Photo {
        format,
        fingerprint: fingerprint(&bytes),
        bytes,
    })
}

/// Identify the container format from magic bytes.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Option<PhotoFormat> {
    if bytes.starts_with(JPEG_SOI) {
        return Some(PhotoFormat::Jpeg);
    }
    if bytes.starts_with(PNG_SIGNATURE) {
        return Some(PhotoFormat::Png);
    }
    if bytes.starts_with(GIF87_SIGNATURE) || bytes.starts_with(GIF89_SIGNATURE) {
        return Some(PhotoFormat::Gif);
    }
    if bytes.len() >= 12 && bytes.starts_with(RIFF_SIGNATURE) && &bytes[8..12] == WEBP_FOURCC {
        return Some(PhotoFormat::Webp);
    }
    if bytes.len() >= 12
        && &bytes[4..8] == FTYP_BOX
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
    {
        return Some(PhotoFormat::Heic);
    }
    None
}

fn is_complete(format: PhotoFormat, bytes: &[u8]) -> bool {
    match format {
        PhotoFormat::Jpeg => {
            bytes.len() >= JPEG_SOI.len() + JPEG_EOI.len() && bytes.ends_with(JPEG_EOI)
        }
        // IEND chunk type is followed by its 4-byte CRC.
        PhotoFormat::Png => bytes.len() >= PNG_SIGNATURE.len() + 12 && {
            let tail = &bytes[bytes.len() - 8..];
            &tail[..4] == PNG_IEND
        },
        PhotoFormat::Gif | PhotoFormat::Heic | PhotoFormat::Webp => true,
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::constants::{JPEG_EOI, JPEG_SOI, PNG_IEND, PNG_SIGNATURE};

    /// Minimal JPEG-shaped payload; `tag` makes fingerprints distinct.
    pub fn jpeg(tag: u8) -> Vec<u8> {
        let mut bytes = JPEG_SOI.to_vec();
        bytes.extend_from_slice(&[0xE0, 0x00, 0x10, tag, tag]);
        bytes.extend_from_slice(JPEG_EOI);
        bytes
    }

    pub fn png() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(PNG_IEND);
        bytes.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
        bytes
    }
}
