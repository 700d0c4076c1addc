//! Terminal driver for a workout in progress.
//!
//! A one-second interval feeds `tick`; commands typed on stdin drive every
//! other transition.

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use fit_core::model::SessionId;
use fit_core::workout::{
    RestKind, Transition, WorkoutPhase, format_clock, format_duration, termination_summary,
};
use services::{WorkoutError, WorkoutLoopService, WorkoutRun};

const FINALIZE_ATTEMPTS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Done { value: u32, weight: f64 },
    Skip,
    StartWarmup,
    EndWarmup,
    Status,
    Quit,
    Help,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(Input::Status);
    };
    match word.to_ascii_lowercase().as_str() {
        "done" | "d" => {
            let value = parts
                .next()
                .ok_or("usage: done <reps|seconds> [weight]")?
                .parse::<u32>()
                .map_err(|_| "reps/seconds must be a whole number".to_string())?;
            let weight = match parts.next() {
                Some(raw) => raw
                    .parse::<f64>()
                    .map_err(|_| "weight must be a number".to_string())?,
                None => 0.0,
            };
            Ok(Input::Done { value, weight })
        }
        "skip" | "s" => Ok(Input::Skip),
        "start" => Ok(Input::StartWarmup),
        "end" => Ok(Input::EndWarmup),
        "status" => Ok(Input::Status),
        "quit" | "q" | "terminate" => Ok(Input::Quit),
        "help" | "?" => Ok(Input::Help),
        other => Err(format!("unknown command {other:?}; type help")),
    }
}

fn print_help() {
    println!("commands:");
    println!("  start                   start the warm-up countdown");
    println!("  end                     finish the warm-up");
    println!("  done <value> [weight]   record the current set");
    println!("  skip                    skip the warm-up or the current rest");
    println!("  status                  show progress");
    println!("  quit                    end the workout early");
}

fn prompt_current(run: &WorkoutRun) {
    let exec = run.execution();
    if let Some(planned) = exec.current_exercise() {
        println!(
            "> {} - set {}/{} (target {})",
            planned.label(),
            exec.current_set_number(),
            planned.sets,
            planned.target
        );
    }
}

fn print_status(run: &WorkoutRun, svc: &WorkoutLoopService) {
    let exec = run.execution();
    let now = svc.clock().now();
    println!(
        "{} | {} | {}% done | {} elapsed",
        run.title(),
        run.phase(),
        exec.overall_progress(),
        format_duration(exec.elapsed_seconds(now))
    );
    let countdown = exec.countdown();
    if matches!(run.phase(), WorkoutPhase::WarmingUp | WorkoutPhase::Resting) {
        let state = if countdown.is_active() { "" } else { " (paused)" };
        println!("  countdown {}{state}", format_clock(countdown.remaining_seconds()));
    }
    prompt_current(run);
}

fn report(run: &WorkoutRun, transition: &Transition) {
    match transition {
        Transition::ExercisesStarted | Transition::RestFinished => prompt_current(run),
        Transition::RestStarted { kind, seconds } => {
            let what = match kind {
                RestKind::BetweenSets => "before the next set",
                RestKind::AfterExercise => "before the next exercise",
            };
            println!("rest {} {what} (skip to continue)", format_clock(*seconds));
            if let Some(next) = run.execution().current_exercise() {
                println!("  up next: {}", next.label());
            }
        }
        Transition::Completed(done) => {
            println!("workout complete in {}", format_duration(done.duration_seconds));
        }
        Transition::Terminated(ended) => {
            println!("{}", termination_summary(&ended.stats));
            if ended.payload.is_none() {
                println!("no sets were recorded; nothing saved");
            }
        }
    }
}

/// Apply one typed command. Invalid commands for the current phase are
/// reported and ignored.
pub async fn apply(
    svc: &WorkoutLoopService,
    run: &mut WorkoutRun,
    input: Input,
) -> Result<(), WorkoutError> {
    let result = match input {
        Input::Help => {
            print_help();
            return Ok(());
        }
        Input::Status => {
            print_status(run, svc);
            return Ok(());
        }
        Input::StartWarmup => svc.begin_warmup(run).map(|step| {
            println!("warm-up started");
            step
        }),
        Input::EndWarmup => svc.end_warmup(run),
        Input::Skip => match run.phase() {
            WorkoutPhase::WarmingUp => svc.skip_warmup(run),
            _ => svc.skip_rest(run),
        },
        Input::Done { value, weight } => svc.record_set(run, value, weight).await,
        Input::Quit => svc.terminate(run).await,
    };

    match result {
        Ok(step) => {
            if let Some(t) = &step.transition {
                report(run, t);
            }
            Ok(())
        }
        Err(WorkoutError::Execution(err)) => {
            println!("{err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Keep retrying a failed result hand-off with a growing pause.
async fn settle(svc: &WorkoutLoopService, run: &mut WorkoutRun) -> anyhow::Result<()> {
    for attempt in 1..FINALIZE_ATTEMPTS {
        match svc.finalize(run).await {
            Ok(_) => return Ok(()),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "saving workout results failed");
                tokio::time::sleep(Duration::from_secs(attempt)).await;
            }
        }
    }
    svc.finalize(run)
        .await
        .context("saving workout results")?;
    Ok(())
}

pub async fn run_workout(svc: &WorkoutLoopService, session_id: SessionId) -> anyhow::Result<()> {
    let mut run = svc.start(session_id).await?;
    println!("{} - type help for commands", run.title());
    if run.phase() == WorkoutPhase::WarmingUp {
        println!("warm-up ready: start, end or skip");
    } else {
        prompt_current(&run);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while !run.is_finished() {
        let outcome = tokio::select! {
            _ = ticker.tick() => {
                let step = svc.tick(&mut run);
                if let Some(t) = &step.transition {
                    report(&run, t);
                }
                Ok(())
            }
            line = lines.next_line() => {
                match line.context("reading stdin")? {
                    Some(line) => match parse_input(&line) {
                        Ok(input) => apply(svc, &mut run, input).await,
                        Err(msg) => {
                            println!("{msg}");
                            Ok(())
                        }
                    },
                    None if run.phase() == WorkoutPhase::WarmingUp => {
                        tracing::info!(session_id = %session_id, "input closed during warm-up");
                        return Ok(());
                    }
                    None => apply(svc, &mut run, Input::Quit).await,
                }
            }
        };

        if let Err(err) = outcome {
            match err {
                WorkoutError::Storage(_) => settle(svc, &mut run).await?,
                other => return Err(other.into()),
            }
        }
    }

    if run.is_persisted() {
        println!("results saved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fit_core::time::fixed_clock;
    use services::AppServices;
    use storage::repository::Storage;

    #[test]
    fn commands_parse_with_defaults() {
        assert_eq!(
            parse_input("done 12").unwrap(),
            Input::Done {
                value: 12,
                weight: 0.0
            }
        );
        assert_eq!(
            parse_input("d 8 22.5").unwrap(),
            Input::Done {
                value: 8,
                weight: 22.5
            }
        );
        assert_eq!(parse_input("  ").unwrap(), Input::Status);
        assert_eq!(parse_input("Q").unwrap(), Input::Quit);
        assert!(parse_input("done").is_err());
        assert!(parse_input("done x").is_err());
        assert!(parse_input("jump").is_err());
    }

    #[tokio::test]
    async fn typed_commands_drive_a_template_session_to_completion() {
        let services = AppServices::from_storage(Storage::in_memory(), fixed_clock())
            .await
            .unwrap();
        let plans = services.plans();
        let template = plans.list_templates().await.unwrap().remove(0);
        let session = plans.instantiate_template(template.id, None).await.unwrap();

        let svc = services.workouts();
        let mut run = svc.start(session.id).await.unwrap();
        apply(&svc, &mut run, Input::Skip).await.unwrap();
        // wrong phase is reported, not fatal
        apply(&svc, &mut run, Input::EndWarmup).await.unwrap();

        while !run.is_finished() {
            apply(&svc, &mut run, Input::Done { value: 5, weight: 0.0 })
                .await
                .unwrap();
            if run.phase() == WorkoutPhase::Resting {
                apply(&svc, &mut run, Input::Skip).await.unwrap();
            }
        }
        assert!(run.is_persisted());

        let stored = plans.get_session(session.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert!(stored.exercises.iter().all(|e| e.result.is_some()));
    }
}
