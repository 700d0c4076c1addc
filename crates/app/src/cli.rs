use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fit", version, about = "Plan workouts, run them set by set, and review your history")]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(long = "db", env = "FIT_DB_URL", default_value = "sqlite://fit.sqlite3", global = true)]
    pub db_url: String,

    /// Directory holding progress photo files
    #[arg(long, env = "FIT_PHOTOS_DIR", default_value = "photos", global = true)]
    pub photos_dir: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the exercise library
    #[command(subcommand)]
    Exercises(ExerciseCommand),

    /// Manage planned sessions
    #[command(subcommand)]
    Sessions(SessionCommand),

    /// Manage reusable session templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Run a planned session interactively
    Run {
        session_id: u64,
    },

    /// Durations of completed workouts
    History {
        #[arg(long, default_value = "30d")]
        range: String,
    },

    /// Progression of one exercise across completed workouts
    Progress {
        exercise_id: u64,
        #[arg(long, default_value = "30d")]
        range: String,
    },

    /// Workout frequency and most used exercises
    Stats {
        #[arg(long, default_value = "30d")]
        range: String,
    },

    /// Progress photo timeline
    #[command(subcommand)]
    Photos(PhotoCommand),

    /// Insert the default exercise library and templates
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum ExerciseCommand {
    List,
    Add(NewExercise),
    Delete { id: u64 },
}

#[derive(Args, Debug)]
pub struct NewExercise {
    #[arg(long)]
    pub name: String,

    /// FORCE or CARDIO
    #[arg(long, default_value = "FORCE")]
    pub category: String,

    /// Comma-separated muscle groups
    #[arg(long, value_delimiter = ',', required = true)]
    pub muscles: Vec<String>,

    #[arg(long)]
    pub equipment: Option<String>,

    #[arg(long)]
    pub instructions: Option<String>,

    #[arg(long, default_value_t = 3)]
    pub sets: u32,

    /// Target reps per set
    #[arg(long, conflicts_with = "duration", required_unless_present = "duration")]
    pub reps: Option<u32>,

    /// Target seconds per set
    #[arg(long)]
    pub duration: Option<u32>,

    #[arg(long, default_value_t = 60)]
    pub rest_between: u32,

    #[arg(long, default_value_t = 120)]
    pub rest_after: u32,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    List,
    Show { id: u64 },
    Create(NewSession),
    Rename { id: u64, title: String },
    Delete { id: u64 },
}

#[derive(Args, Debug)]
pub struct NewSession {
    #[arg(long)]
    pub title: String,

    /// Exercise IDs in order; each uses its library defaults
    #[arg(long = "exercise", required = true)]
    pub exercises: Vec<u64>,

    #[arg(long, default_value_t = 0)]
    pub warmup: u32,

    /// RFC3339 timestamp or YYYY-MM-DD (defaults to now)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<DateTime<Utc>>,

    /// Store as a reusable template
    #[arg(long)]
    pub template: bool,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    List,
    Instantiate {
        id: u64,
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PhotoCommand {
    /// Photos grouped by capture day or month, newest first
    List {
        /// day or month
        #[arg(long, default_value = "day")]
        group: String,
    },
    Show {
        id: u64,
    },
    Add(NewPhoto),
    /// Replace a photo's notes; omit them to clear
    Notes {
        id: u64,
        notes: Option<String>,
    },
    Delete {
        id: u64,
    },
}

#[derive(Args, Debug)]
pub struct NewPhoto {
    /// JPEG, PNG or WebP image, at most 5MB
    pub file: PathBuf,

    /// When the photo was taken (defaults to now)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Override the type guessed from the file extension
    #[arg(long)]
    pub mime: Option<String>,

    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    #[arg(long, requires = "width")]
    pub height: Option<u32>,
}

pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("expected RFC3339 or YYYY-MM-DD, got {raw:?}"))
}
