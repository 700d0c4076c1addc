//! Historical analytics over completed workouts.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use fit_core::model::{ExerciseId, ExerciseResult, SessionId};
use storage::repository::{ExerciseRepository, SessionRepository};

use crate::Clock;
use crate::error::AnalyticsError;

//
// ─── DATE RANGES ───────────────────────────────────────────────────────────────
//

/// Look-back window for analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "3m")]
    Last3Months,
    #[serde(rename = "6m")]
    Last6Months,
    #[serde(rename = "1y")]
    LastYear,
}

impl DateRange {
    #[must_use]
    pub fn days(self) -> i64 {
        match self {
            Self::Last30Days => 30,
            Self::Last3Months => 90,
            Self::Last6Months => 180,
            Self::LastYear => 365,
        }
    }

    /// Start of the window ending at `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last30Days => "30d",
            Self::Last3Months => "3m",
            Self::Last6Months => "6m",
            Self::LastYear => "1y",
        }
    }
}

impl FromStr for DateRange {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "30d" => Ok(Self::Last30Days),
            "3m" => Ok(Self::Last3Months),
            "6m" => Ok(Self::Last6Months),
            "1y" => Ok(Self::LastYear),
            other => Err(AnalyticsError::InvalidRange(other.to_string())),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── REPORT TYPES ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    pub date: NaiveDate,
    pub duration_seconds: u32,
    pub session_id: SessionId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationHistory {
    pub range: DateRange,
    pub workouts: Vec<DurationPoint>,
    pub total_workouts: usize,
    /// Rounded to whole seconds; zero without workouts.
    pub average_duration_seconds: u32,
}

/// One session's performance of a single exercise.
///
/// `average_value` holds reps or seconds depending on `is_duration_based`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionPoint {
    pub date: NaiveDate,
    pub session_id: SessionId,
    pub actual_sets: u32,
    pub average_value: f64,
    pub average_weight: f64,
    pub total_volume: f64,
    pub is_duration_based: bool,
}

/// First-to-last change across a progression.
///
/// Percentages are zero when the first value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgressionTrends {
    pub value_change: f64,
    pub weight_change: f64,
    pub volume_change: f64,
    pub value_percentage: i64,
    pub weight_percentage: i64,
    pub volume_percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProgression {
    pub exercise_id: ExerciseId,
    pub range: DateRange,
    pub points: Vec<ProgressionPoint>,
    pub total_sessions: usize,
    pub trends: ProgressionTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryExercise {
    pub exercise_id: ExerciseId,
    pub name: String,
    pub category: String,
    pub total_sessions: u32,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyStats {
    pub range: DateRange,
    pub total_workouts: usize,
    pub period_days: i64,
    pub average_per_day: f64,
    pub average_per_week: f64,
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[allow(clippy::cast_possible_truncation)]
fn rounded_percentage(change: f64, base: f64) -> i64 {
    (change / base * 100.0).round() as i64
}

/// Whole-number percentage change from `old` to `new`.
///
/// A zero baseline yields 100 for any increase and 0 otherwise.
#[must_use]
pub fn percentage_change(old: f64, new: f64) -> i64 {
    if old == 0.0 {
        return if new > 0.0 { 100 } else { 0 };
    }
    rounded_percentage(new - old, old)
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = len as f64;
    values.sum::<f64>() / len
}

fn progression_point(
    date: DateTime<Utc>,
    session_id: SessionId,
    result: &ExerciseResult,
    is_duration_based: bool,
) -> ProgressionPoint {
    let volume: f64 = result
        .actual_values
        .iter()
        .enumerate()
        .map(|(i, &v)| f64::from(v) * result.weights.get(i).copied().unwrap_or(0.0))
        .sum();

    ProgressionPoint {
        date: date.date_naive(),
        session_id,
        actual_sets: result.actual_sets,
        average_value: round_to(
            mean(result.actual_values.iter().map(|&v| f64::from(v))),
            1,
        ),
        average_weight: round_to(mean(result.weights.iter().copied()), 1),
        total_volume: volume.round(),
        is_duration_based,
    }
}

fn trends(points: &[ProgressionPoint]) -> ProgressionTrends {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return ProgressionTrends::default();
    };
    if points.len() < 2 {
        return ProgressionTrends::default();
    }

    let value_change = last.average_value - first.average_value;
    let weight_change = last.average_weight - first.average_weight;
    let volume_change = last.total_volume - first.total_volume;
    let pct = |change: f64, base: f64| {
        if base > 0.0 {
            rounded_percentage(change, base)
        } else {
            0
        }
    };

    ProgressionTrends {
        value_change: round_to(value_change, 1),
        weight_change: round_to(weight_change, 1),
        volume_change: volume_change.round(),
        value_percentage: pct(value_change, first.average_value),
        weight_percentage: pct(weight_change, first.average_weight),
        volume_percentage: pct(volume_change, first.total_volume),
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Read-only queries over completed sessions.
#[derive(Clone)]
pub struct AnalyticsService {
    clock: Clock,
    exercises: Arc<dyn ExerciseRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        exercises: Arc<dyn ExerciseRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            exercises,
            sessions,
        }
    }

    /// Durations of completed workouts in the window, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn workout_duration_history(
        &self,
        range: DateRange,
    ) -> Result<DurationHistory, AnalyticsError> {
        let since = range.since(self.clock.now());
        let workouts: Vec<DurationPoint> = self
            .sessions
            .list_completed_since(since)
            .await?
            .into_iter()
            .filter_map(|s| {
                s.duration_seconds.map(|duration_seconds| DurationPoint {
                    date: s.date.date_naive(),
                    duration_seconds,
                    session_id: s.id,
                    title: s.title,
                })
            })
            .collect();

        let total: u64 = workouts.iter().map(|w| u64::from(w.duration_seconds)).sum();
        let average = if workouts.is_empty() {
            0
        } else {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let avg = (total as f64 / workouts.len() as f64).round() as u32;
            avg
        };

        Ok(DurationHistory {
            range,
            total_workouts: workouts.len(),
            average_duration_seconds: average,
            workouts,
        })
    }

    /// Per-session averages for one exercise, limited to sessions where it
    /// has recorded results.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn exercise_progression(
        &self,
        exercise_id: ExerciseId,
        range: DateRange,
    ) -> Result<ExerciseProgression, AnalyticsError> {
        let library_flag = self
            .exercises
            .get_exercise(exercise_id)
            .await?
            .map(|e| e.is_duration_based());
        let since = range.since(self.clock.now());

        let mut points = Vec::new();
        for session in self.sessions.list_completed_since(since).await? {
            for planned in &session.exercises {
                if planned.exercise_id != exercise_id {
                    continue;
                }
                let Some(result) = &planned.result else {
                    continue;
                };
                let duration_based =
                    library_flag.unwrap_or_else(|| planned.target.is_duration_based());
                points.push(progression_point(
                    session.date,
                    session.id,
                    result,
                    duration_based,
                ));
            }
        }

        Ok(ExerciseProgression {
            exercise_id,
            range,
            total_sessions: points.len(),
            trends: trends(&points),
            points,
        })
    }

    /// Exercises planned in any completed session, most recently used first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn exercises_from_history(&self) -> Result<Vec<HistoryExercise>, AnalyticsError> {
        let mut usage: HashMap<ExerciseId, (u32, DateTime<Utc>, Option<String>)> = HashMap::new();
        for session in self.sessions.list_sessions().await? {
            if !session.completed {
                continue;
            }
            for planned in &session.exercises {
                let entry = usage
                    .entry(planned.exercise_id)
                    .or_insert((0, session.date, planned.exercise_name.clone()));
                entry.0 += 1;
                if session.date > entry.1 {
                    entry.1 = session.date;
                }
            }
        }

        let mut items = Vec::with_capacity(usage.len());
        for (exercise_id, (count, last_used, planned_name)) in usage {
            let exercise = self.exercises.get_exercise(exercise_id).await?;
            let (name, category) = match exercise {
                Some(e) => (e.name, e.category.as_str().to_string()),
                None => (
                    planned_name.unwrap_or_else(|| "Unknown Exercise".to_string()),
                    "UNKNOWN".to_string(),
                ),
            };
            items.push(HistoryExercise {
                exercise_id,
                name,
                category,
                total_sessions: count,
                last_used,
            });
        }
        items.sort_by(|a, b| {
            b.last_used
                .cmp(&a.last_used)
                .then_with(|| b.total_sessions.cmp(&a.total_sessions))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn frequency_stats(&self, range: DateRange) -> Result<FrequencyStats, AnalyticsError> {
        let since = range.since(self.clock.now());
        let total_workouts = self.sessions.list_completed_since(since).await?.len();
        let period_days = range.days();

        #[allow(clippy::cast_precision_loss)]
        let per_day = total_workouts as f64 / period_days as f64;
        Ok(FrequencyStats {
            range,
            total_workouts,
            period_days,
            average_per_day: round_to(per_day, 2),
            average_per_week: round_to(per_day * 7.0, 2),
        })
    }
}
