//! Astromine - Entry Point
//!
//! Runs one full match between two planner-driven controllers and writes the
//! replay to the log directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use astromine::bot::PlannerAgent;
use astromine::core::config::GameParams;
use astromine::engine::Game;

#[derive(Debug, Parser)]
#[command(name = "astromine", about = "Run a full simulated match and record the replay")]
struct Args {
    /// Seed for map generation and game length
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML file with parameter overrides
    #[arg(long)]
    params: Option<PathBuf>,

    /// Directory replays are written into
    #[arg(long, default_value = "game_logs")]
    log_dir: PathBuf,

    /// Skip writing the replay file
    #[arg(long)]
    no_replay: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "astromine=info".into()),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "game failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> astromine::core::Result<()> {
    let params = match &args.params {
        Some(path) => GameParams::load_toml(path)?,
        None => GameParams::default(),
    };

    let mut game = Game::new(
        params,
        args.seed,
        [Box::new(PlannerAgent::new(1)), Box::new(PlannerAgent::new(2))],
    );
    let replay = game.play();

    let (p1, p2) = game.scores();
    tracing::info!(turns = game.turn(), p1, p2, "game over");

    if !args.no_replay {
        let path = replay.save(&args.log_dir)?;
        tracing::info!(path = %path.display(), "replay saved");
    }
    Ok(())
}
