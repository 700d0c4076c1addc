use chrono::{DateTime, Utc};
use fit_core::model::{SessionId, ValidatedSession, WorkoutSession};
use fit_core::workout::ExercisePayload;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    db_err, id_to_i64, map_planned_row, ser, session_id_from_i64, to_json, u32_from_i64,
};
use crate::repository::{SessionRepository, StorageError};

const SELECT_SESSION: &str = r"
    SELECT id, title, date, warmup_seconds, is_template, duration_seconds,
           completed, terminated_early
    FROM sessions
";

fn map_session_row(row: &SqliteRow) -> Result<WorkoutSession, StorageError> {
    Ok(WorkoutSession {
        id: session_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        date: row.try_get("date").map_err(ser)?,
        warmup_seconds: u32_from_i64("warmup_seconds", row.try_get("warmup_seconds").map_err(ser)?)?,
        is_template: row.try_get::<i64, _>("is_template").map_err(ser)? != 0,
        duration_seconds: row
            .try_get::<Option<i64>, _>("duration_seconds")
            .map_err(ser)?
            .map(|v| u32_from_i64("duration_seconds", v))
            .transpose()?,
        completed: row.try_get::<i64, _>("completed").map_err(ser)? != 0,
        terminated_early: row.try_get::<i64, _>("terminated_early").map_err(ser)? != 0,
        exercises: Vec::new(),
    })
}

impl SqliteRepository {
    async fn load_planned(&self, session: &mut WorkoutSession) -> Result<(), StorageError> {
        let rows = sqlx::query(
            r"
            SELECT se.exercise_id, e.name AS exercise_name, se.position, se.sets,
                   se.reps, se.duration_seconds, se.rest_between_sets, se.rest_after,
                   se.actual_sets, se.actual_values, se.weights
            FROM session_exercises se
            LEFT JOIN exercises e ON e.id = se.exercise_id
            WHERE se.session_id = ?1
            ORDER BY se.position ASC
            ",
        )
        .bind(id_to_i64("session_id", session.id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        session.exercises = rows
            .iter()
            .map(map_planned_row)
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    async fn load_sessions(&self, rows: Vec<SqliteRow>) -> Result<Vec<WorkoutSession>, StorageError> {
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let mut session = map_session_row(&row)?;
            self.load_planned(&mut session).await?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    async fn store_outcome(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
        terminated_early: bool,
    ) -> Result<(), StorageError> {
        let session_id = id_to_i64("session_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let is_template: Option<i64> =
            sqlx::query_scalar("SELECT is_template FROM sessions WHERE id = ?1")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        match is_template {
            None => return Err(StorageError::NotFound),
            Some(flag) if flag != 0 => return Err(StorageError::Conflict),
            Some(_) => {}
        }

        sqlx::query(
            r"
            UPDATE sessions
            SET completed = 1, terminated_early = ?2, duration_seconds = ?3
            WHERE id = ?1
            ",
        )
        .bind(session_id)
        .bind(i64::from(terminated_early))
        .bind(i64::from(duration_seconds))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for result in results {
            sqlx::query(
                r"
                UPDATE session_exercises
                SET actual_sets = ?3, actual_values = ?4, weights = ?5
                WHERE session_id = ?1 AND position = ?2
                ",
            )
            .bind(session_id)
            .bind(i64::from(result.order))
            .bind(i64::from(result.actual_sets))
            .bind(to_json(&result.actual_values)?)
            .bind(to_json(&result.weights)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            INSERT INTO sessions (title, date, warmup_seconds, is_template)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(&session.title)
        .bind(session.date)
        .bind(i64::from(session.warmup_seconds))
        .bind(i64::from(session.is_template))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        let session_id = res.last_insert_rowid();

        for planned in &session.exercises {
            sqlx::query(
                r"
                INSERT INTO session_exercises (
                    session_id, exercise_id, position, sets, reps, duration_seconds,
                    rest_between_sets, rest_after
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(session_id)
            .bind(id_to_i64("exercise_id", planned.exercise_id.value())?)
            .bind(i64::from(planned.order))
            .bind(i64::from(planned.sets))
            .bind(planned.target.reps().map(i64::from))
            .bind(planned.target.duration_seconds().map(i64::from))
            .bind(i64::from(planned.rest_between_sets))
            .bind(i64::from(planned.rest_after))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        session_id_from_i64(session_id)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<WorkoutSession>, StorageError> {
        let sql = format!("{SELECT_SESSION} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("session_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut session = map_session_row(&row)?;
        self.load_planned(&mut session).await?;
        Ok(Some(session))
    }

    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        let sql = format!("{SELECT_SESSION} WHERE is_template = 0 ORDER BY date DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        self.load_sessions(rows).await
    }

    async fn list_templates(&self) -> Result<Vec<WorkoutSession>, StorageError> {
        let sql = format!("{SELECT_SESSION} WHERE is_template = 1 ORDER BY title ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        self.load_sessions(rows).await
    }

    async fn rename_session(&self, id: SessionId, title: &str) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE sessions SET title = ?2 WHERE id = ?1")
            .bind(id_to_i64("session_id", id.value())?)
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id_to_i64("session_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn record_completion(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.store_outcome(id, duration_seconds, results, false).await
    }

    async fn record_termination(
        &self,
        id: SessionId,
        duration_seconds: u32,
        results: &[ExercisePayload],
    ) -> Result<(), StorageError> {
        self.store_outcome(id, duration_seconds, results, true).await
    }

    async fn list_completed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkoutSession>, StorageError> {
        let sql = format!(
            "{SELECT_SESSION} WHERE is_template = 0 AND completed = 1 AND date >= ?1 \
             ORDER BY date ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        self.load_sessions(rows).await
    }
}
