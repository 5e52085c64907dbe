//! The move-generation engine behind the board states.
//!
//! The rest of the crate reaches the engine only through this narrow surface:
//! - [`init_engine`] builds an [`EngineHandle`] for an engine kind
//! - [`EngineHandle::genmove`] asks for a move under a [`TimeSpec`]
//! - [`EngineHandle::notify`] reports moves the engine did not generate
//! - [`position::Position`] evaluates legality and applies moves
//! - [`playout::judge_dead_groups`] decides dead groups for official scoring
//!
//! Engine kinds are `random`, `montecarlo` and `uct`. Arguments are given as
//! a comma-separated `key=value` list.

pub mod mcts;
pub mod montecarlo;
pub mod playout;
pub mod position;
pub mod time;

pub use self::playout::seed_rng;

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::debug;

use crate::constants::{N_SIMS, PASS, RESIGN, RESIGN_THRES};
use crate::coord::{Coord, vertex_str};
use crate::error::{Error, Result};
use crate::state::BoardState;

use self::mcts::{SearchParams, TreeNode, best_child, tree_search};
use self::montecarlo::MonteCarlo;
use self::playout::choose_random_move;
use self::position::{Color, Move, Position};
use self::time::{Budget, Clock, TimeSpec};

/// Supported engine kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EngineKind {
    Random,
    MonteCarlo,
    Uct,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Random => "random",
            EngineKind::MonteCarlo => "montecarlo",
            EngineKind::Uct => "uct",
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(EngineKind::Random),
            "montecarlo" => Ok(EngineKind::MonteCarlo),
            "uct" => Ok(EngineKind::Uct),
            _ => Err(Error::UnsupportedEngine(s.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that can propose moves for a position.
pub trait MoveGenerator {
    /// Propose a move for `color`. May return `PASS` or `RESIGN`.
    fn genmove(&mut self, pos: &Position, color: Color, budget: &Budget) -> Coord;

    /// Learn about a move played on the game board.
    fn notify(&mut self, _pos: &Position, _mv: Move) {}

    /// Simulations per move when no time specification is given.
    fn default_sims(&self) -> usize {
        N_SIMS
    }
}

/// Uniformly random legal moves that never fill the mover's own eyes.
struct RandomEngine;

impl MoveGenerator for RandomEngine {
    fn genmove(&mut self, pos: &Position, color: Color, _budget: &Budget) -> Coord {
        choose_random_move(pos, color).unwrap_or(PASS)
    }

    fn default_sims(&self) -> usize {
        1
    }
}

/// UCT search with RAVE.
struct UctEngine {
    params: SearchParams,
    resign_threshold: f64,
}

impl MoveGenerator for UctEngine {
    fn genmove(&mut self, pos: &Position, color: Color, budget: &Budget) -> Coord {
        // If opponent passed and we're past the opening, pass too
        if pos.last_move.is_some_and(|m| m.is_pass() && m.color != color) && pos.moves > 2 {
            return PASS;
        }

        let mut tree = TreeNode::new(pos, color);
        let pt = tree_search(&mut tree, budget, &self.params);

        let winrate = best_child(&tree).map(|c| c.winrate()).unwrap_or(0.0);
        if winrate < self.resign_threshold && pt != PASS {
            return RESIGN;
        }
        pt
    }
}

/// Parsed `key=value` engine arguments.
struct EngineArgs<'a> {
    kind: EngineKind,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> EngineArgs<'a> {
    fn parse(kind: EngineKind, args: &'a str) -> Self {
        let mut pairs = Vec::new();
        for item in args.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (k, v) = item.split_once('=').unwrap_or((item, ""));
            pairs.push((k.trim(), v.trim()));
        }
        EngineArgs { kind, pairs }
    }

    fn reject(&self, key: &str, value: &str) -> Error {
        Error::UnsupportedEngine(format!(
            "{}: unsupported argument {key}={value}",
            self.kind
        ))
    }

    /// Apply every pair through `set`, which returns false for unknown keys.
    fn apply(&self, mut set: impl FnMut(&str, &str) -> Option<bool>) -> Result<()> {
        for &(k, v) in &self.pairs {
            match set(k, v) {
                Some(true) => {}
                _ => return Err(self.reject(k, v)),
            }
        }
        Ok(())
    }
}

fn build_generator(kind: EngineKind, args: &str) -> Result<Box<dyn MoveGenerator>> {
    let args = EngineArgs::parse(kind, args);
    Ok(match kind {
        EngineKind::Random => {
            args.apply(|_, _| Some(false))?;
            Box::new(RandomEngine)
        }
        EngineKind::MonteCarlo => {
            let mut mc = MonteCarlo::default();
            args.apply(|k, v| match k {
                "playouts" => v.parse().ok().map(|n| {
                    mc.playouts = n;
                    n > 0
                }),
                "resign_threshold" => v.parse().ok().map(|t| {
                    mc.resign_threshold = t;
                    true
                }),
                _ => Some(false),
            })?;
            Box::new(mc)
        }
        EngineKind::Uct => {
            let mut uct = UctEngine {
                params: SearchParams::default(),
                resign_threshold: RESIGN_THRES,
            };
            args.apply(|k, v| match k {
                "rave_equiv" => v.parse().ok().map(|n| {
                    uct.params.rave_equiv = n;
                    n > 0
                }),
                "expand_visits" => v.parse().ok().map(|n| {
                    uct.params.expand_visits = n;
                    true
                }),
                "resign_threshold" => v.parse().ok().map(|t| {
                    uct.resign_threshold = t;
                    true
                }),
                _ => Some(false),
            })?;
            Box::new(uct)
        }
    })
}

/// A running engine pinned to the current game board.
pub struct EngineHandle {
    kind: EngineKind,
    generator: Box<dyn MoveGenerator>,
    board: BoardState,
    clock: Clock,
}

/// Create an engine of the given kind, tracking `initial` as its game board.
pub fn init_engine(kind: &str, args: &str, initial: &BoardState) -> Result<EngineHandle> {
    let kind: EngineKind = kind.parse()?;
    let generator = build_generator(kind, args)?;
    Ok(EngineHandle {
        kind,
        generator,
        board: initial.clone(),
        clock: Clock::default(),
    })
}

impl EngineHandle {
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// The board the engine currently believes is in play.
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Generate a move for `color` on `board`. Returns a native coordinate, `PASS` or `RESIGN`.
    ///
    /// Blocks for the duration of the budget; the budget is checked between
    /// simulations, not enforced mid-simulation.
    pub fn genmove(&mut self, board: &BoardState, time: &TimeSpec, color: Color) -> Coord {
        self.board = board.clone();
        let pos = board.position();
        let budget = self.clock.budget(
            time,
            self.generator.default_sims(),
            pos.empty_points().count(),
        );
        let started = Instant::now();
        let coord = self.generator.genmove(pos, color, &budget);
        self.clock.charge(started.elapsed());
        debug!(
            engine = %self.kind,
            %color,
            vertex = %vertex_str(coord, pos.size()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine move"
        );
        coord
    }

    /// Inform the engine of a move it did not generate; `board` is the position after the move.
    pub fn notify(&mut self, board: &BoardState, mv: Move) {
        self.board = board.clone();
        self.generator.notify(board.position(), mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::playout::seed_rng;

    #[test]
    fn test_unknown_engine_is_rejected() {
        let b = BoardState::new(9).unwrap();
        match init_engine("gnugo", "", &b) {
            Err(Error::UnsupportedEngine(name)) => assert_eq!(name, "gnugo"),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("gnugo should be rejected"),
        }
    }

    #[test]
    fn test_engine_arguments() {
        let b = BoardState::new(9).unwrap();
        assert!(init_engine("uct", "rave_equiv=2000, expand_visits=4", &b).is_ok());
        assert!(init_engine("montecarlo", "playouts=4,resign_threshold=0.1", &b).is_ok());
        assert!(init_engine("uct", "threads=2", &b).is_err());
        assert!(init_engine("random", "x=1", &b).is_err());
        assert!(init_engine("montecarlo", "playouts=0", &b).is_err());
    }

    #[test]
    fn test_random_engine_plays_legal_moves() {
        seed_rng(9);
        let b = BoardState::new(9).unwrap();
        let mut engine = init_engine("random", "", &b).unwrap();
        let c = engine.genmove(&b, &TimeSpec::Default, Color::Black);
        assert!(b.position().is_legal(Color::Black, c, true));
    }

    #[test]
    fn test_uct_engine_follows_opponent_pass() {
        seed_rng(2);
        let mut b = BoardState::new(5).unwrap();
        for (a, c) in [(12, Color::Black), (6, Color::White), (18, Color::Black)] {
            b = b.play(a, c).unwrap();
        }
        b = b.play(25, Color::White).unwrap();
        let mut engine = init_engine("uct", "", &b).unwrap();
        let c = engine.genmove(&b, &TimeSpec::Simulations(10), Color::Black);
        assert_eq!(c, PASS);
    }

    #[test]
    fn test_notify_tracks_board() {
        let b = BoardState::new(9).unwrap();
        let mut engine = init_engine("random", "", &b).unwrap();
        let next = b.play(40, Color::Black).unwrap();
        engine.notify(&next, Move::new(next.last_move().unwrap().coord, Color::Black));
        assert_eq!(engine.board(), &next);
    }
}
