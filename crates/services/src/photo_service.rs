//! Progress photo timeline: upload metadata, notes, deletion and grouping.
//!
//! Image bytes are the caller's concern; this service records what was
//! uploaded and decides the stored filename.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use fit_core::model::{Photo, PhotoDraft, PhotoId};
use storage::repository::{PhotoRepository, StorageError};

use crate::Clock;
use crate::error::PhotoServiceError;

//
// ─── TIMELINE ──────────────────────────────────────────────────────────────────
//

/// How photos are bucketed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineGrouping {
    #[default]
    Day,
    Month,
}

impl TimelineGrouping {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    fn label(self, photo: &Photo) -> String {
        match self {
            Self::Day => photo.capture_date.format("%Y-%m-%d").to_string(),
            Self::Month => photo.capture_date.format("%B %Y").to_string(),
        }
    }
}

impl FromStr for TimelineGrouping {
    type Err = PhotoServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "date" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            other => Err(PhotoServiceError::InvalidGrouping(other.to_string())),
        }
    }
}

impl fmt::Display for TimelineGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoGroup {
    pub label: String,
    pub photos: Vec<Photo>,
}

/// Bucket photos by capture day or month, newest bucket and newest photo first.
#[must_use]
pub fn group_photos(mut photos: Vec<Photo>, grouping: TimelineGrouping) -> Vec<PhotoGroup> {
    photos.sort_by(|a, b| {
        b.capture_date
            .cmp(&a.capture_date)
            .then(b.id.value().cmp(&a.id.value()))
    });

    let mut groups: Vec<PhotoGroup> = Vec::new();
    for photo in photos {
        let label = grouping.label(&photo);
        match groups.last_mut() {
            Some(group) if group.label == label => group.photos.push(photo),
            _ => groups.push(PhotoGroup {
                label,
                photos: vec![photo],
            }),
        }
    }
    groups
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct PhotoService {
    clock: Clock,
    photos: Arc<dyn PhotoRepository>,
}

fn not_found(id: PhotoId) -> impl FnOnce(StorageError) -> PhotoServiceError {
    move |err| match err {
        StorageError::NotFound => PhotoServiceError::NotFound(id),
        other => PhotoServiceError::Storage(other),
    }
}

impl PhotoService {
    #[must_use]
    pub fn new(clock: Clock, photos: Arc<dyn PhotoRepository>) -> Self {
        Self { clock, photos }
    }

    /// Validate an upload and record its metadata.
    ///
    /// # Errors
    ///
    /// Returns `PhotoServiceError::Photo` when the upload is rejected and
    /// `DuplicateFilename` if another photo was stored in the same millisecond.
    pub async fn add_photo(&self, draft: PhotoDraft) -> Result<Photo, PhotoServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self
            .photos
            .insert_photo(&validated)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => PhotoServiceError::DuplicateFilename,
                other => PhotoServiceError::Storage(other),
            })?;
        tracing::info!(
            photo_id = %id,
            filename = %validated.filename,
            size = validated.file_size,
            "photo added"
        );
        Ok(validated.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `PhotoServiceError::Storage` if repository access fails.
    pub async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, PhotoServiceError> {
        Ok(self.photos.get_photo(id).await?)
    }

    /// All photos, most recently captured first.
    ///
    /// # Errors
    ///
    /// Returns `PhotoServiceError::Storage` if repository access fails.
    pub async fn list_photos(&self) -> Result<Vec<Photo>, PhotoServiceError> {
        Ok(self.photos.list_photos().await?)
    }

    /// # Errors
    ///
    /// Returns `PhotoServiceError::Storage` if repository access fails.
    pub async fn timeline(
        &self,
        grouping: TimelineGrouping,
    ) -> Result<Vec<PhotoGroup>, PhotoServiceError> {
        Ok(group_photos(self.photos.list_photos().await?, grouping))
    }

    /// Replace a photo's notes; blank notes clear them.
    ///
    /// # Errors
    ///
    /// Returns `PhotoServiceError::NotFound` if the photo does not exist.
    pub async fn update_notes(
        &self,
        id: PhotoId,
        notes: Option<String>,
    ) -> Result<Photo, PhotoServiceError> {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.photos
            .update_photo_notes(id, notes.as_deref(), self.clock.now())
            .await
            .map_err(not_found(id))?;
        self.photos
            .get_photo(id)
            .await?
            .ok_or(PhotoServiceError::NotFound(id))
    }

    /// Remove a photo's metadata and return it so the caller can drop the file.
    ///
    /// # Errors
    ///
    /// Returns `PhotoServiceError::NotFound` if the photo does not exist.
    pub async fn delete_photo(&self, id: PhotoId) -> Result<Photo, PhotoServiceError> {
        let removed = self.photos.delete_photo(id).await.map_err(not_found(id))?;
        tracing::info!(photo_id = %id, filename = %removed.filename, "photo deleted");
        Ok(removed)
    }
}
