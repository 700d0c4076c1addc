use chrono::{DateTime, Utc};
use fit_core::model::{Photo, PhotoId, ValidatedPhoto};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_photo_row, photo_id_from_i64};
use crate::repository::{PhotoRepository, StorageError};

const SELECT_PHOTO: &str = r"
    SELECT id, filename, original_name, capture_date, notes, file_size, mime_type,
           width, height, created_at, updated_at
    FROM photos
";

#[async_trait::async_trait]
impl PhotoRepository for SqliteRepository {
    async fn insert_photo(&self, photo: &ValidatedPhoto) -> Result<PhotoId, StorageError> {
        let file_size = i64::try_from(photo.file_size)
            .map_err(|_| StorageError::Serialization("file_size overflow".into()))?;
        let res = sqlx::query(
            r"
            INSERT INTO photos (
                filename, original_name, capture_date, notes, file_size, mime_type,
                width, height, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ",
        )
        .bind(&photo.filename)
        .bind(&photo.original_name)
        .bind(photo.capture_date)
        .bind(&photo.notes)
        .bind(file_size)
        .bind(photo.format.mime_type())
        .bind(photo.dimensions.map(|d| i64::from(d.width)))
        .bind(photo.dimensions.map(|d| i64::from(d.height)))
        .bind(photo.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        photo_id_from_i64(res.last_insert_rowid())
    }

    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, StorageError> {
        let sql = format!("{SELECT_PHOTO} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("photo_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_photo_row).transpose()
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, StorageError> {
        let sql = format!("{SELECT_PHOTO} ORDER BY capture_date DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_photo_row).collect()
    }

    async fn update_photo_notes(
        &self,
        id: PhotoId,
        notes: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE photos SET notes = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id_to_i64("photo_id", id.value())?)
            .bind(notes)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<Photo, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let sql = format!("{SELECT_PHOTO} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("photo_id", id.value())?)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(StorageError::NotFound)?;
        let photo = map_photo_row(&row)?;

        sqlx::query("DELETE FROM photos WHERE id = ?1")
            .bind(id_to_i64("photo_id", id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(photo)
    }
}
