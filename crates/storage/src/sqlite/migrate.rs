use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Brings the schema up to date.
///
/// Version 1 creates the exercise library, sessions, planned session exercises
/// and their indexes. Version 2 adds progress photo metadata.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS exercises (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    category TEXT NOT NULL CHECK (category IN ('FORCE', 'CARDIO')),
                    muscle_groups TEXT NOT NULL,
                    equipment_needed TEXT,
                    instructions TEXT,
                    is_custom INTEGER NOT NULL DEFAULT 0,
                    default_sets INTEGER NOT NULL CHECK (default_sets > 0),
                    default_reps INTEGER CHECK (default_reps > 0),
                    default_duration INTEGER CHECK (default_duration > 0),
                    default_rest_between_sets INTEGER NOT NULL CHECK (default_rest_between_sets > 0),
                    default_rest_after INTEGER NOT NULL CHECK (default_rest_after > 0),
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK ((default_reps IS NULL) <> (default_duration IS NULL))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sessions (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    date TEXT NOT NULL,
                    warmup_seconds INTEGER NOT NULL CHECK (warmup_seconds >= 0),
                    is_template INTEGER NOT NULL DEFAULT 0,
                    duration_seconds INTEGER CHECK (duration_seconds >= 0),
                    completed INTEGER NOT NULL DEFAULT 0,
                    terminated_early INTEGER NOT NULL DEFAULT 0
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_exercises (
                    id INTEGER PRIMARY KEY,
                    session_id INTEGER NOT NULL,
                    exercise_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    sets INTEGER NOT NULL CHECK (sets > 0),
                    reps INTEGER,
                    duration_seconds INTEGER,
                    rest_between_sets INTEGER NOT NULL CHECK (rest_between_sets >= 0),
                    rest_after INTEGER NOT NULL CHECK (rest_after >= 0),
                    actual_sets INTEGER CHECK (actual_sets >= 0),
                    actual_values TEXT,
                    weights TEXT,
                    UNIQUE (session_id, position),
                    CHECK ((reps IS NULL) <> (duration_seconds IS NULL)),
                    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
                    FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE RESTRICT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sessions_template_completed_date
                    ON sessions (is_template, completed, date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_exercises_exercise
                    ON session_exercises (exercise_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    // Version 2: progress photos.
    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS photos (
                    id INTEGER PRIMARY KEY,
                    filename TEXT NOT NULL UNIQUE,
                    original_name TEXT NOT NULL,
                    capture_date TEXT NOT NULL,
                    notes TEXT,
                    file_size INTEGER NOT NULL CHECK (file_size > 0),
                    mime_type TEXT NOT NULL
                        CHECK (mime_type IN ('image/jpeg', 'image/png', 'image/webp')),
                    width INTEGER CHECK (width > 0),
                    height INTEGER CHECK (height > 0),
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK ((width IS NULL) = (height IS NULL))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_photos_capture_date
                    ON photos (capture_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(2_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
