use anyhow::{Context, bail};
use serde::Serialize;

use fit_core::Clock;
use fit_core::model::{
    ExerciseCategory, ExerciseDefaults, ExerciseDraft, ExerciseId, Photo, PhotoDraft,
    PhotoFormat, PhotoId, SessionDraft, SessionId, SetTarget, WorkoutSession,
};
use fit_core::workout::format_duration;
use services::{AppServices, DateRange, TimelineGrouping, planned_from_defaults};
use storage::repository::Storage;
use storage::seed::seed_defaults;

use crate::cli::{
    ExerciseCommand, NewExercise, NewPhoto, NewSession, PhotoCommand, SessionCommand,
    TemplateCommand,
};
use crate::photos::{PhotoStore, SourceFile};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_range(raw: &str) -> anyhow::Result<DateRange> {
    Ok(raw.parse::<DateRange>()?)
}

//
// ─── EXERCISES ─────────────────────────────────────────────────────────────────
//

pub async fn exercises(
    services: &AppServices,
    command: ExerciseCommand,
    json: bool,
) -> anyhow::Result<()> {
    let svc = services.exercises();
    match command {
        ExerciseCommand::List => {
            let exercises = svc.list_exercises().await?;
            if json {
                return print_json(&exercises);
            }
            for e in &exercises {
                println!(
                    "{:>4}  {:<24} {:<7} {} x {}  [{}]",
                    e.id.value(),
                    e.name,
                    e.category.as_str(),
                    e.defaults.sets,
                    e.defaults.target,
                    e.muscle_groups.join(", ")
                );
            }
        }
        ExerciseCommand::Add(new) => {
            let created = svc.create_exercise(exercise_draft(new)?).await?;
            if json {
                return print_json(&created);
            }
            println!("added exercise {} ({})", created.id, created.name);
        }
        ExerciseCommand::Delete { id } => {
            svc.delete_exercise(ExerciseId::new(id)).await?;
            println!("deleted exercise {id}");
        }
    }
    Ok(())
}

fn exercise_draft(new: NewExercise) -> anyhow::Result<ExerciseDraft> {
    let category: ExerciseCategory = new.category.parse()?;
    let target = SetTarget::from_parts(new.reps, new.duration)?;
    Ok(ExerciseDraft {
        name: new.name,
        category,
        muscle_groups: new.muscles,
        equipment_needed: new.equipment,
        instructions: new.instructions,
        is_custom: true,
        defaults: ExerciseDefaults {
            sets: new.sets,
            target,
            rest_between_sets: new.rest_between,
            rest_after: new.rest_after,
        },
    })
}

//
// ─── SESSIONS & TEMPLATES ──────────────────────────────────────────────────────
//

fn session_status(s: &WorkoutSession) -> &'static str {
    match (s.is_template, s.completed, s.terminated_early) {
        (true, _, _) => "template",
        (false, true, true) => "ended early",
        (false, true, false) => "completed",
        (false, false, _) => "planned",
    }
}

fn print_session_line(s: &WorkoutSession) {
    println!(
        "{:>4}  {}  {:<28} {:>2} exercises  {}",
        s.id.value(),
        s.date.format("%Y-%m-%d"),
        s.title,
        s.exercises.len(),
        session_status(s)
    );
}

fn print_session_detail(s: &WorkoutSession) {
    println!("#{} {} ({})", s.id, s.title, session_status(s));
    println!("date:    {}", s.date.format("%Y-%m-%d %H:%M"));
    if s.has_warmup() {
        println!("warm-up: {}", format_duration(s.warmup_seconds));
    }
    if let Some(duration) = s.duration_seconds {
        println!("took:    {}", format_duration(duration));
    }
    for planned in &s.exercises {
        println!(
            "  {}. {} - {} x {} (rest {}s / {}s)",
            planned.order,
            planned.label(),
            planned.sets,
            planned.target,
            planned.rest_between_sets,
            planned.rest_after
        );
        if let Some(result) = &planned.result {
            println!(
                "     done {} sets: {:?} weights {:?}",
                result.actual_sets, result.actual_values, result.weights
            );
        }
    }
}

pub async fn sessions(
    services: &AppServices,
    clock: Clock,
    command: SessionCommand,
    json: bool,
) -> anyhow::Result<()> {
    let plans = services.plans();
    match command {
        SessionCommand::List => {
            let sessions = plans.list_sessions().await?;
            if json {
                return print_json(&sessions);
            }
            sessions.iter().for_each(print_session_line);
        }
        SessionCommand::Show { id } => {
            let Some(session) = plans.get_session(SessionId::new(id)).await? else {
                bail!("session {id} not found");
            };
            if json {
                return print_json(&session);
            }
            print_session_detail(&session);
        }
        SessionCommand::Create(new) => {
            let draft = session_draft(services, clock, new).await?;
            let created = if draft.is_template {
                plans.create_template(draft).await?
            } else {
                plans.create_session(draft).await?
            };
            if json {
                return print_json(&created);
            }
            println!("created session {} ({})", created.id, created.title);
        }
        SessionCommand::Rename { id, title } => {
            plans.rename_session(SessionId::new(id), &title).await?;
            println!("renamed session {id}");
        }
        SessionCommand::Delete { id } => {
            plans.delete_session(SessionId::new(id)).await?;
            println!("deleted session {id}");
        }
    }
    Ok(())
}

async fn session_draft(
    services: &AppServices,
    clock: Clock,
    new: NewSession,
) -> anyhow::Result<SessionDraft> {
    let library = services.exercises();
    let mut planned = Vec::with_capacity(new.exercises.len());
    for (raw_id, order) in new.exercises.iter().zip(1u32..) {
        let id = ExerciseId::new(*raw_id);
        let exercise = library
            .get_exercise(id)
            .await?
            .with_context(|| format!("exercise {id} not found"))?;
        planned.push(planned_from_defaults(&exercise, order));
    }

    Ok(SessionDraft {
        title: new.title,
        date: new.date.unwrap_or_else(|| clock.now()),
        warmup_seconds: new.warmup,
        is_template: new.template,
        exercises: planned,
    })
}

pub async fn templates(
    services: &AppServices,
    command: TemplateCommand,
    json: bool,
) -> anyhow::Result<()> {
    let plans = services.plans();
    match command {
        TemplateCommand::List => {
            let templates = plans.list_templates().await?;
            if json {
                return print_json(&templates);
            }
            templates.iter().for_each(print_session_line);
        }
        TemplateCommand::Instantiate { id, date } => {
            let session = plans.instantiate_template(SessionId::new(id), date).await?;
            if json {
                return print_json(&session);
            }
            println!("created session {} from template {id}", session.id);
        }
    }
    Ok(())
}

//
// ─── ANALYTICS ─────────────────────────────────────────────────────────────────
//

pub async fn history(services: &AppServices, range: &str, json: bool) -> anyhow::Result<()> {
    let history = services
        .analytics()
        .workout_duration_history(parse_range(range)?)
        .await?;
    if json {
        return print_json(&history);
    }
    for w in &history.workouts {
        println!(
            "{}  {:<28} {}",
            w.date,
            w.title,
            format_duration(w.duration_seconds)
        );
    }
    println!(
        "{} workouts in the last {}, average {}",
        history.total_workouts,
        history.range,
        format_duration(history.average_duration_seconds)
    );
    Ok(())
}

pub async fn progress(
    services: &AppServices,
    exercise_id: u64,
    range: &str,
    json: bool,
) -> anyhow::Result<()> {
    let progression = services
        .analytics()
        .exercise_progression(ExerciseId::new(exercise_id), parse_range(range)?)
        .await?;
    if json {
        return print_json(&progression);
    }
    for p in &progression.points {
        let unit = if p.is_duration_based { "s" } else { " reps" };
        println!(
            "{}  {} sets  avg {}{unit}  avg weight {}  volume {}",
            p.date, p.actual_sets, p.average_value, p.average_weight, p.total_volume
        );
    }
    let t = progression.trends;
    println!(
        "{} sessions; value {:+} ({}%), weight {:+} ({}%), volume {:+} ({}%)",
        progression.total_sessions,
        t.value_change,
        t.value_percentage,
        t.weight_change,
        t.weight_percentage,
        t.volume_change,
        t.volume_percentage
    );
    Ok(())
}

#[derive(Serialize)]
struct StatsReport {
    frequency: services::FrequencyStats,
    exercises: Vec<services::HistoryExercise>,
}

pub async fn stats(services: &AppServices, range: &str, json: bool) -> anyhow::Result<()> {
    let analytics = services.analytics();
    let report = StatsReport {
        frequency: analytics.frequency_stats(parse_range(range)?).await?,
        exercises: analytics.exercises_from_history().await?,
    };
    if json {
        return print_json(&report);
    }
    let f = report.frequency;
    println!(
        "{} workouts in {} days: {} per day, {} per week",
        f.total_workouts, f.period_days, f.average_per_day, f.average_per_week
    );
    for e in &report.exercises {
        println!(
            "  {:<24} {:<7} {:>3} sessions  last {}",
            e.name,
            e.category,
            e.total_sessions,
            e.last_used.format("%Y-%m-%d")
        );
    }
    Ok(())
}

//
// ─── PHOTOS ────────────────────────────────────────────────────────────────────
//

fn print_photo_line(p: &Photo) {
    let size_kb = p.file_size.div_ceil(1024);
    println!(
        "  {:>4}  {}  {:<22} {:>6} KB  {}",
        p.id.value(),
        p.capture_date.format("%Y-%m-%d %H:%M"),
        p.original_name,
        size_kb,
        p.notes.as_deref().unwrap_or("")
    );
}

pub async fn photos(
    services: &AppServices,
    store: &PhotoStore,
    command: PhotoCommand,
    json: bool,
) -> anyhow::Result<()> {
    let svc = services.photos();
    match command {
        PhotoCommand::List { group } => {
            let grouping: TimelineGrouping = group.parse()?;
            let timeline = svc.timeline(grouping).await?;
            if json {
                return print_json(&timeline);
            }
            for group in &timeline {
                println!("{} ({})", group.label, group.photos.len());
                group.photos.iter().for_each(print_photo_line);
            }
        }
        PhotoCommand::Show { id } => {
            let Some(photo) = svc.get_photo(PhotoId::new(id)).await? else {
                bail!("photo {id} not found");
            };
            if json {
                return print_json(&photo);
            }
            println!("#{} {} ({})", photo.id, photo.original_name, photo.format);
            println!("taken:  {}", photo.capture_date.format("%Y-%m-%d %H:%M"));
            println!("file:   {}", store.path(&photo.filename).display());
            if let Some(d) = photo.dimensions {
                println!("size:   {}x{}", d.width, d.height);
            }
            if let Some(notes) = &photo.notes {
                println!("notes:  {notes}");
            }
        }
        PhotoCommand::Add(new) => {
            let source = PhotoStore::inspect(&new.file).await?;
            let photo = svc.add_photo(photo_draft(&new, source)).await?;
            if let Err(err) = store.save(&new.file, &photo.filename).await {
                svc.delete_photo(photo.id).await?;
                return Err(err);
            }
            if json {
                return print_json(&photo);
            }
            println!("added photo {} ({})", photo.id, photo.filename);
        }
        PhotoCommand::Notes { id, notes } => {
            let photo = svc.update_notes(PhotoId::new(id), notes).await?;
            if json {
                return print_json(&photo);
            }
            println!("updated notes for photo {id}");
        }
        PhotoCommand::Delete { id } => {
            let removed = svc.delete_photo(PhotoId::new(id)).await?;
            if !store.remove(&removed.filename).await? {
                tracing::warn!(
                    photo_id = id,
                    filename = %removed.filename,
                    "photo file was already missing"
                );
            }
            println!("deleted photo {id}");
        }
    }
    Ok(())
}

fn photo_draft(new: &NewPhoto, source: SourceFile) -> PhotoDraft {
    let mime_type = new.mime.clone().unwrap_or_else(|| {
        PhotoFormat::from_file_name(&source.name)
            .map_or("application/octet-stream", |f| f.mime_type())
            .to_string()
    });
    PhotoDraft {
        original_name: source.name,
        mime_type,
        file_size: source.size,
        capture_date: new.date,
        notes: new.notes.clone(),
        width: new.width,
        height: new.height,
    }
}

//
// ─── SEED ──────────────────────────────────────────────────────────────────────
//

pub async fn seed(storage: &Storage, clock: Clock) -> anyhow::Result<()> {
    let report = seed_defaults(storage, clock.now()).await?;
    println!(
        "seeded {} exercises and {} templates",
        report.exercises_added, report.templates_added
    );
    Ok(())
}
