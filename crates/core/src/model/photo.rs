use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::model::exercise::non_blank;
use crate::model::ids::PhotoId;

/// Largest accepted upload, in bytes.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhotoError {
    #[error("photo file name cannot be empty")]
    EmptyName,

    #[error("photo file is empty")]
    EmptyFile,

    #[error("photo is {size} bytes; maximum size is 5MB")]
    TooLarge { size: u64 },

    #[error("unsupported photo type {0:?}; allowed types: image/jpeg, image/png, image/webp")]
    UnsupportedType(String),

    #[error("width and height must be given together and be greater than zero")]
    InvalidDimensions,
}

//
// ─── FORMAT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoFormat {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
}

impl PhotoFormat {
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Guess the format from a file name's extension.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

//
// ─── PHOTO TYPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDimensions {
    pub width: u32,
    pub height: u32,
}

/// Metadata for an uploaded progress photo, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDraft {
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    /// Defaults to the upload time.
    pub capture_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PhotoDraft {
    /// Check the upload against the accepted types and size, and name the
    /// stored file `photo_<unix millis>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError` for an empty name or file, an oversized file, a
    /// type other than JPEG/PNG/WebP, or a half-given or zero dimension.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedPhoto, PhotoError> {
        let original_name = self.original_name.trim().to_string();
        if original_name.is_empty() {
            return Err(PhotoError::EmptyName);
        }
        if self.file_size == 0 {
            return Err(PhotoError::EmptyFile);
        }
        if self.file_size > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge {
                size: self.file_size,
            });
        }
        let format = PhotoFormat::from_mime_type(&self.mime_type)
            .ok_or_else(|| PhotoError::UnsupportedType(self.mime_type.clone()))?;

        let dimensions = match (self.width, self.height) {
            (None, None) => None,
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(PhotoDimensions { width, height })
            }
            _ => return Err(PhotoError::InvalidDimensions),
        };

        Ok(ValidatedPhoto {
            filename: stored_filename(&original_name, format, now),
            original_name,
            capture_date: self.capture_date.unwrap_or(now),
            notes: non_blank(self.notes),
            file_size: self.file_size,
            format,
            dimensions,
            created_at: now,
        })
    }
}

fn stored_filename(original_name: &str, format: PhotoFormat, now: DateTime<Utc>) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map_or_else(|| format.extension().to_string(), str::to_ascii_lowercase);
    format!("photo_{}.{ext}", now.timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPhoto {
    pub filename: String,
    pub original_name: String,
    pub capture_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub file_size: u64,
    pub format: PhotoFormat,
    pub dimensions: Option<PhotoDimensions>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedPhoto {
    #[must_use]
    pub fn assign_id(self, id: PhotoId) -> Photo {
        Photo {
            id,
            filename: self.filename,
            original_name: self.original_name,
            capture_date: self.capture_date,
            notes: self.notes,
            file_size: self.file_size,
            format: self.format,
            dimensions: self.dimensions,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// A progress photo on the timeline. The image itself lives on disk under
/// `filename`; only its metadata is stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub filename: String,
    pub original_name: String,
    pub capture_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub file_size: u64,
    pub format: PhotoFormat,
    pub dimensions: Option<PhotoDimensions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
