//! gobridge command line.
//!
//! - `gobridge selfplay` - Play the engine against a random host policy and
//!   store the trajectories
//! - `gobridge replay <file.sgf>` - Replay SGF records, optionally storing them
//! - `gobridge inspect <file>` - Decode a trajectory file and summarize it
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gobridge::engine::seed_rng;
use gobridge::rollout::{RolloutConfig, random_policy, rollout};
use gobridge::{Color, ScoreMode, TransitionLog, codec, replay};

/// Immutable Go board states, trajectory recording and replay
#[derive(Parser)]
#[command(name = "gobridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, ValueEnum)]
enum Side {
    Black,
    White,
}

impl From<Side> for Color {
    fn from(s: Side) -> Self {
        match s {
            Side::Black => Color::Black,
            Side::White => Color::White,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play the engine against a random host policy
    Selfplay {
        /// Board size (at most 15 to be storable)
        #[arg(long, default_value_t = 9)]
        size: usize,
        /// Engine kind: random, montecarlo or uct
        #[arg(long, default_value = "uct")]
        engine: String,
        /// Engine arguments as key=value,...
        #[arg(long, default_value = "")]
        engine_args: String,
        /// Time specification: =SIMS, SECONDS per move or _SECONDS per game
        #[arg(long, default_value = "")]
        time: String,
        /// Color played by the engine
        #[arg(long, value_enum, default_value_t = Side::White)]
        engine_color: Side,
        #[arg(long, default_value_t = 1)]
        games: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the encoded trajectories
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay SGF game records
    Replay {
        /// SGF file, possibly holding several games
        input: PathBuf,
        /// Where to write the encoded trajectories
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the final board of every game
        #[arg(long)]
        show: bool,
    },
    /// Decode a trajectory file and summarize its games
    Inspect {
        input: PathBuf,
        /// Print the final board of every game
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Selfplay {
            size,
            engine,
            engine_args,
            time,
            engine_color,
            games,
            seed,
            output,
        } => {
            if let Some(seed) = seed {
                seed_rng(seed);
            }
            let config = RolloutConfig::default()
                .with_board_size(size)
                .with_engine(engine, engine_args)
                .with_time_spec(time)
                .with_engine_color(engine_color.into());
            run_selfplay(&config, games, output.as_deref())
        }
        Commands::Replay {
            input,
            output,
            show,
        } => run_replay(&input, output.as_deref(), show),
        Commands::Inspect { input, show } => run_inspect(&input, show),
    }
}

fn run_selfplay(config: &RolloutConfig, games: usize, output: Option<&Path>) -> Result<()> {
    let mut logs = Vec::with_capacity(games);
    for game in 1..=games {
        let r = rollout(config, random_policy)
            .with_context(|| format!("selfplay game {game} failed"))?;
        let winner = r.result.winner.map_or("nobody".to_string(), |c| c.to_string());
        info!(
            game,
            moves = r.log.len(),
            black = r.result.black_score,
            white = r.result.white_score,
            black_resigned = r.result.black_resigned,
            white_resigned = r.result.white_resigned,
            "{winner} wins"
        );
        logs.push(r.log);
    }
    if let Some(path) = output {
        write_logs(path, &logs)?;
    }
    Ok(())
}

fn run_replay(input: &Path, output: Option<&Path>, show: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let games = replay::replay_collection(&text)
        .with_context(|| format!("failed to replay {}", input.display()))?;
    for (i, g) in games.iter().enumerate() {
        println!(
            "game {}: {}x{}, handicap {}, rules {}, {} moves",
            i + 1,
            g.info.size,
            g.info.size,
            g.info.handicap,
            g.log.current().rules(),
            g.log.len()
        );
        if show {
            println!("{}", g.log.current());
        }
    }
    if let Some(path) = output {
        let logs: Vec<_> = games.into_iter().map(|g| g.log).collect();
        write_logs(path, &logs)?;
    }
    Ok(())
}

fn run_inspect(input: &Path, show: bool) -> Result<()> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let logs = codec::read_from(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", input.display()))?;
    for (i, log) in logs.iter().enumerate() {
        let last = log.current();
        println!(
            "game {}: {}x{}, {} moves, terminal {}, fast score W{:+.1}",
            i + 1,
            log.board_size(),
            log.board_size(),
            log.len(),
            last.is_terminal(),
            last.score(ScoreMode::Fast)
        );
        if show {
            println!("{last}");
        }
    }
    Ok(())
}

fn write_logs(path: &Path, logs: &[TransitionLog]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    codec::write_to(BufWriter::new(file), logs)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(games = logs.len(), path = %path.display(), "wrote trajectories");
    Ok(())
}
