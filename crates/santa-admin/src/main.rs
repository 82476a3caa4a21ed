//! Operator entry point for Secret Santa games.
//!
//! Loads configuration from the environment, selects the repository
//! backend, and runs one subcommand against it. Notices produced by a
//! subcommand go to the log through [`LogNotifier`]; the chat transport
//! lives outside this binary.
//!
//! ```text
//! CLI --> Admin (load, mutate, save) --> GameRepository (PostgreSQL | memory)
//!                                   \--> notice fan-out --> Notifier
//! ```

mod cli;
mod commands;
mod config;
mod error;

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use santa_db::{
    GameRepository, MemoryRepository, PgRepository, PostgresConfig, PostgresPool, StorageKind,
};
use santa_game::Player;
use santa_notify::{Dispatch, LogNotifier};
use santa_types::GameId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::{Admin, describe};
use crate::config::{AdminConfig, ConfigError};
use crate::error::AdminError;

/// Application entry point.
///
/// Initializes logging, loads configuration, connects to storage and runs
/// the requested subcommand.
///
/// # Errors
///
/// Returns an error if configuration, storage or the operation fails.
#[tokio::main]
async fn main() -> Result<(), AdminError> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = AdminConfig::from_env()?;
    info!(
        storage = ?config.storage,
        max_connections = config.database.as_ref().map(PostgresConfig::max_connections),
        title_limit = config.limits.title,
        description_limit = config.limits.description,
        "configuration loaded"
    );

    let pool = match config.storage {
        StorageKind::Postgres => Some(connect(&config).await?),
        StorageKind::Memory => None,
    };

    let result = run(&config, pool.as_ref(), cli.command).await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    result
}

async fn connect(config: &AdminConfig) -> Result<PostgresPool, AdminError> {
    let database = config
        .database
        .as_ref()
        .ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let pool = PostgresPool::connect(database).await?;
    Ok(pool)
}

async fn run(
    config: &AdminConfig,
    pool: Option<&PostgresPool>,
    command: Command,
) -> Result<(), AdminError> {
    if matches!(command, Command::Migrate) {
        let pool = pool.ok_or(AdminError::PostgresRequired { command: "migrate" })?;
        pool.run_migrations().await?;
        return Ok(());
    }

    let repo: Arc<dyn GameRepository> = match pool {
        Some(pool) => {
            Arc::new(PgRepository::from_pool(pool).with_csv_delimiter(config.csv_delimiter))
        }
        None => {
            warn!("using in-memory storage; nothing outlives this process");
            Arc::new(MemoryRepository::new().with_csv_delimiter(config.csv_delimiter))
        }
    };
    let admin = Admin::new(repo, Arc::new(LogNotifier), config.limits);

    match command {
        Command::Migrate => {}
        Command::Create {
            initiator_id,
            initiator_name,
            title,
            description,
            date,
        } => {
            let game = admin
                .create(initiator_id, &initiator_name, &title, &description, date)
                .await?;
            println!("{}", describe(&game));
        }
        Command::Join {
            game,
            telegram_id,
            fullname,
            username,
        } => {
            let game = admin
                .join(game, Player::new(telegram_id, fullname, username))
                .await?;
            println!("{}", describe(&game));
        }
        Command::Toggle { game } => {
            let game = admin.toggle(game).await?;
            println!("{}", describe(&game));
        }
        Command::Shuffle { game } => {
            let (game, notices) = admin.shuffle(game).await?;
            settle(notices).await;
            println!("{}", describe(&game));
        }
        Command::SetDescription { game, description } => {
            let (game, notices) = admin.set_description(game, &description).await?;
            settle(notices).await;
            println!("{}", describe(&game));
        }
        Command::SetDate { game, date } => {
            let (game, notices) = admin.set_date(game, date).await?;
            settle(notices).await;
            println!("{}", describe(&game));
        }
        Command::Show { game } => {
            println!("{}", describe(&admin.show(game).await?));
        }
        Command::List { user } => {
            let games = admin.list(user).await?;
            info!(user, count = games.len(), "games found");
            for game in &games {
                println!("{}\n", describe(game));
            }
        }
        Command::Export { game, out } => export(&admin, game, out.as_deref()).await?,
        Command::Delete { game } => {
            let (game, notices) = admin.delete(game).await?;
            settle(notices).await;
            println!("deleted {}", game.title());
        }
        Command::Demo => {
            let game = admin.demo().await?;
            println!("{}", describe(&game));
        }
    }

    Ok(())
}

async fn export(admin: &Admin, game: GameId, out: Option<&Path>) -> Result<(), AdminError> {
    let Some(bytes) = admin.export(game).await? else {
        warn!(game_id = %game, "no players to export");
        return Ok(());
    };
    match out {
        Some(path) => {
            tokio::fs::write(path, &bytes).await?;
            info!(path = %path.display(), bytes = bytes.len(), "players exported");
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

/// Wait for the fan-out so the process does not exit mid-delivery.
async fn settle(notices: Dispatch) {
    let summary = notices.wait().await;
    info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "notices sent"
    );
}
