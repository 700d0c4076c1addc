mod cli;
mod commands;
mod db;
mod photos;
mod runner;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fit_core::Clock;
use fit_core::model::SessionId;
use services::AppServices;
use storage::repository::Storage;

use crate::cli::{Cli, Command};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("FIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let clock = Clock::system();

    // Open + migrate SQLite here so core and services never touch the filesystem.
    let db_url = db::normalize_sqlite_url(&cli.db_url);
    db::prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    tracing::debug!(db_url = %db_url, "storage ready");

    if let Command::Seed = cli.command {
        return commands::seed(&storage, clock).await;
    }

    let services = AppServices::from_storage(storage, clock).await?;
    let json = cli.json;
    match cli.command {
        Command::Exercises(cmd) => commands::exercises(&services, cmd, json).await,
        Command::Sessions(cmd) => commands::sessions(&services, clock, cmd, json).await,
        Command::Templates(cmd) => commands::templates(&services, cmd, json).await,
        Command::Run { session_id } => {
            runner::run_workout(&services.workouts(), SessionId::new(session_id)).await
        }
        Command::History { range } => commands::history(&services, &range, json).await,
        Command::Progress { exercise_id, range } => {
            commands::progress(&services, exercise_id, &range, json).await
        }
        Command::Stats { range } => commands::stats(&services, &range, json).await,
        Command::Photos(cmd) => {
            let store = photos::PhotoStore::new(cli.photos_dir);
            commands::photos(&services, &store, cmd, json).await
        }
        Command::Seed => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    run(cli).await
}
