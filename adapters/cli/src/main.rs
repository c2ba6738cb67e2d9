#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that flies Gravitation levels headlessly.
//!
//! `run` replays a recorded input tape against a level and reports the race
//! time; `leaderboard` prints the stored standings.

mod config;
mod session;
mod tape;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gravitation_core::{GhostFrame, GAME_TITLE};
use gravitation_persistence::{HttpBlobStore, ScoreKeeper};
use gravitation_system_leaderboard::Submission;
use gravitation_world::LevelSetup;
use tracing::info;

use crate::{
    config::{Config, StoreConfig},
    session::{Session, StepOutcome},
};

/// Headless Gravitation driver.
#[derive(Debug, Parser)]
#[command(name = "gravitation", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replays an input tape through a level.
    Run(RunArgs),
    /// Prints the stored leaderboard.
    Leaderboard(LeaderboardArgs),
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Base URL of the leaderboard store.
    #[arg(long, env = "GRAVITATION_STORE_URL")]
    store_url: Option<String>,
    /// TOML file with tuning, spawn and store settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Level image.
    #[arg(long)]
    level: PathBuf,
    /// Ship sprite image with alpha channel.
    #[arg(long)]
    sprite: PathBuf,
    /// Input tape, one byte per tick.
    #[arg(long)]
    tape: PathBuf,
    /// Level name used for leaderboard and ghost lookups. Defaults to the image file stem.
    #[arg(long)]
    name: Option<String>,
    /// Ghost JSON to race against instead of the stored best ghost.
    #[arg(long)]
    ghost_in: Option<PathBuf>,
    /// Writes the recorded ghost JSON here when the level is completed.
    #[arg(long)]
    ghost_out: Option<PathBuf>,
    /// Submits the finished time under this player name.
    #[arg(long)]
    user: Option<String>,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Debug, Args)]
struct LeaderboardArgs {
    /// Restricts output to a single level.
    #[arg(long)]
    level: Option<String>,
    #[command(flatten)]
    store: StoreArgs,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Entry point for the Gravitation command-line interface.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Leaderboard(args) => leaderboard(args).await,
    }
}

fn load_config(args: &StoreArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(url) = &args.store_url {
        config.store.url = Some(url.clone());
    }
    Ok(config)
}

async fn score_keeper(store: &StoreConfig) -> Result<Option<ScoreKeeper<HttpBlobStore>>> {
    let Some(url) = &store.url else {
        return Ok(None);
    };
    let client = HttpBlobStore::new(url.clone(), store.timeout())
        .with_context(|| format!("failed to create store client for {url}"))?;
    let mut keeper = ScoreKeeper::new(client, store.layout());
    if !keeper.refresh().await {
        info!("continuing with partially loaded leaderboard data");
    }
    Ok(Some(keeper))
}

async fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.store)?;
    let map = gravitation_raster::load_level(&args.level)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    let sprite = gravitation_raster::load_sprite(&args.sprite)
        .with_context(|| format!("failed to load sprite {}", args.sprite.display()))?;
    let tape_bytes = fs::read(&args.tape)
        .with_context(|| format!("failed to read input tape {}", args.tape.display()))?;
    let inputs = tape::decode(&tape_bytes).context("invalid input tape")?;

    let level_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .level
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("level path has no file name")?,
    };

    let mut keeper = score_keeper(&config.store).await?;
    if args.user.is_some() && keeper.is_none() {
        bail!("--user requires a store URL, pass --store-url or set GRAVITATION_STORE_URL");
    }
    let ghost = match &args.ghost_in {
        Some(path) => Some(read_ghost(path)?),
        None => keeper
            .as_ref()
            .and_then(|keeper| keeper.ghosts().get(&level_name))
            .map(<[GhostFrame]>::to_vec),
    };

    let setup = LevelSetup {
        spawn: config.spawn.origin(sprite.width()),
        map,
        sprite,
        tuning: config.tuning,
    };
    let dt = config.tuning.baseline_frame();
    let mut session = Session::new(level_name, setup);
    session.enter_level(ghost);

    println!("{GAME_TITLE}: {}", session.level_name());
    let mut outcome = StepOutcome::Flying;
    let mut ticks = 0usize;
    for input in inputs {
        outcome = session.step(dt, input);
        ticks += 1;
        if outcome != StepOutcome::Flying {
            break;
        }
    }

    if let Some(pose) = session.ship_pose() {
        println!(
            "ticks: {ticks}  pose: ({:.2}, {:.2}) @ {:.1} deg",
            pose.x, pose.y, pose.rotation
        );
    }

    let time = match outcome {
        StepOutcome::Completed { time } => time,
        StepOutcome::ReturnedToMenu | StepOutcome::InMenu => {
            println!("attempt abandoned after {ticks} ticks");
            return Ok(());
        }
        StepOutcome::Flying => {
            println!("tape ended before the goal, time {}", session.formatted_time());
            return Ok(());
        }
    };
    println!("completed in {}", session.formatted_time());

    if let Some(path) = &args.ghost_out {
        let json = serde_json::to_string(session.recording()).context("failed to encode ghost")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write ghost {}", path.display()))?;
    }

    if let (Some(user), Some(keeper)) = (&args.user, keeper.as_mut()) {
        let submission = keeper
            .submit(session.level_name(), user, time, session.recording())
            .await;
        match submission {
            Submission::NotImproved => println!("no personal best for {user}"),
            Submission::PersonalBest { global_best: true } => {
                println!("new global best for {user}!")
            }
            Submission::PersonalBest { global_best: false } => {
                println!("new personal best for {user}")
            }
        }
    }

    Ok(())
}

fn read_ghost(path: &Path) -> Result<Vec<GhostFrame>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read ghost {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse ghost {}", path.display()))
}

async fn leaderboard(args: LeaderboardArgs) -> Result<()> {
    let config = load_config(&args.store)?;
    let Some(keeper) = score_keeper(&config.store).await? else {
        bail!("a store URL is required, pass --store-url or set GRAVITATION_STORE_URL");
    };

    let board = keeper.leaderboard();
    let levels: Vec<&str> = match &args.level {
        Some(level) => vec![level.as_str()],
        None => board.levels().collect(),
    };
    for level in levels {
        println!("{level}");
        for (rank, (user, time)) in board.standings(level).into_iter().enumerate() {
            println!("  {:>2}. {time}  {user}", rank + 1);
        }
    }
    Ok(())
}
