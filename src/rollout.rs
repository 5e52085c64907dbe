//! Full games between the engine and a host policy.
//!
//! The host policy is any `FnMut(&BoardState, Color) -> ActionId`, passed in
//! at call time. Each move is applied through [`BoardState::play`], recorded
//! as a transition, and reported to both players so an engine's tracked
//! board stays in step. Resignations end the game without a transition.

use tracing::debug;

use crate::constants::{DEFAULT_KOMI, GAME_LEN_FACTOR, RESIGN};
use crate::coord::{ActionId, Coord, from_action, pass_action, to_action};
use crate::engine::playout::{choose_random_move, next_to_move};
use crate::engine::position::{Color, Move};
use crate::engine::time::TimeSpec;
use crate::engine::{EngineHandle, EngineKind, init_engine};
use crate::error::Result;
use crate::state::{BoardState, ScoreMode};
use crate::trajectory::TransitionLog;

/// A host-side move chooser.
pub trait Policy {
    /// Choose an action id for `color`. The resign id ends the game.
    fn choose(&mut self, board: &BoardState, color: Color) -> ActionId;
}

impl<F> Policy for F
where
    F: FnMut(&BoardState, Color) -> ActionId,
{
    fn choose(&mut self, board: &BoardState, color: Color) -> ActionId {
        self(board, color)
    }
}

/// Uniformly random legal move that never fills the mover's own eye; passes
/// when nothing else is left.
pub fn random_policy(board: &BoardState, color: Color) -> ActionId {
    let n = board.size();
    choose_random_move(board.position(), color)
        .and_then(|c| to_action(c, n).ok())
        .unwrap_or_else(|| pass_action(n))
}

/// One side of a game.
pub trait Player {
    /// Native coordinate, `PASS` or `RESIGN`.
    fn choose(&mut self, board: &BoardState, color: Color) -> Result<Coord>;

    /// `board` is the state after `mv`.
    fn notify(&mut self, _board: &BoardState, _mv: Move) {}
}

/// The engine playing under a time specification.
pub struct EnginePlayer {
    pub handle: EngineHandle,
    pub time: TimeSpec,
}

impl Player for EnginePlayer {
    fn choose(&mut self, board: &BoardState, color: Color) -> Result<Coord> {
        Ok(self.handle.genmove(board, &self.time, color))
    }

    fn notify(&mut self, board: &BoardState, mv: Move) {
        self.handle.notify(board, mv);
    }
}

/// A host policy, translated from action ids.
pub struct PolicyPlayer<P>(pub P);

impl<P: Policy> Player for PolicyPlayer<P> {
    fn choose(&mut self, board: &BoardState, color: Color) -> Result<Coord> {
        from_action(self.0.choose(board, color), board.size())
    }
}

#[derive(Clone, Debug)]
pub struct RolloutConfig {
    pub board_size: usize,
    /// Color played by the engine; the host policy plays the other one.
    pub engine_color: Color,
    pub engine_kind: String,
    pub engine_args: String,
    pub time_spec: String,
    pub komi: f32,
    /// Defaults to the engine's game-length cap
    pub max_moves: Option<usize>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            board_size: 9,
            engine_color: Color::White,
            engine_kind: EngineKind::Uct.name().to_string(),
            engine_args: String::new(),
            time_spec: String::new(),
            komi: DEFAULT_KOMI,
            max_moves: None,
        }
    }
}

impl RolloutConfig {
    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = size;
        self
    }

    pub fn with_engine_color(mut self, color: Color) -> Self {
        self.engine_color = color;
        self
    }

    pub fn with_engine(mut self, kind: impl Into<String>, args: impl Into<String>) -> Self {
        self.engine_kind = kind.into();
        self.engine_args = args.into();
        self
    }

    pub fn with_time_spec(mut self, spec: impl Into<String>) -> Self {
        self.time_spec = spec.into();
        self
    }

    pub fn with_komi(mut self, komi: f32) -> Self {
        self.komi = komi;
        self
    }

    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = Some(max_moves);
        self
    }
}

/// Final scores and resignations of a finished game.
#[derive(Clone, Debug, PartialEq)]
pub struct RolloutResult {
    pub black_score: f32,
    pub white_score: f32,
    /// `white_score - black_score`
    pub margin: f32,
    /// `None` only for a jigo.
    pub winner: Option<Color>,
    pub black_resigned: bool,
    pub white_resigned: bool,
}

impl RolloutResult {
    fn from_board(board: &BoardState, resigned: Option<Color>) -> Self {
        let count = board.area(ScoreMode::Official);
        let black_score = count.points(Color::Black, board.rules(), board.komi());
        let white_score = count.points(Color::White, board.rules(), board.komi());
        let margin = white_score - black_score;
        let winner = match resigned {
            Some(c) => Some(c.opponent()),
            None if margin > 0.0 => Some(Color::White),
            None if margin < 0.0 => Some(Color::Black),
            None => None,
        };
        RolloutResult {
            black_score,
            white_score,
            margin,
            winner,
            black_resigned: resigned == Some(Color::Black),
            white_resigned: resigned == Some(Color::White),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Rollout {
    pub log: TransitionLog,
    pub result: RolloutResult,
}

/// Play `black` against `white` from `initial` until the game ends.
///
/// The game ends on two passes, a resignation, or after `max_moves`
/// transitions.
pub fn play_game<'a>(
    initial: BoardState,
    black: &'a mut dyn Player,
    white: &'a mut dyn Player,
    max_moves: usize,
) -> Result<Rollout> {
    let size = initial.size();
    let mut color = next_to_move(initial.position());
    let mut log = TransitionLog::new(initial);
    let mut resigned = None;

    while !log.current().is_terminal() && log.len() < max_moves {
        let board = log.current().clone();
        let player = match color {
            Color::Black => &mut *black,
            Color::White => &mut *white,
        };
        let coord = player.choose(&board, color)?;
        if coord == RESIGN {
            resigned = Some(color);
            break;
        }
        log.play(to_action(coord, size)?, color)?;

        let after = log.current();
        let mv = Move::new(coord, color);
        black.notify(after, mv);
        white.notify(after, mv);
        color = color.opponent();
    }

    let result = RolloutResult::from_board(log.current(), resigned);
    debug!(
        moves = log.len(),
        margin = result.margin,
        winner = ?result.winner,
        resigned = ?resigned,
        "game finished"
    );
    Ok(Rollout { log, result })
}

/// Play the configured engine against `policy`.
///
/// The engine kind and time specification are checked before the board is
/// created.
pub fn rollout(config: &RolloutConfig, policy: impl Policy) -> Result<Rollout> {
    let time: TimeSpec = config.time_spec.parse()?;
    let kind: EngineKind = config.engine_kind.parse()?;

    let board = BoardState::new(config.board_size)?.with_komi(config.komi);
    let handle = init_engine(kind.name(), &config.engine_args, &board)?;
    let mut engine = EnginePlayer { handle, time };
    let mut host = PolicyPlayer(policy);
    let max_moves = config
        .max_moves
        .unwrap_or(GAME_LEN_FACTOR * config.board_size * config.board_size);

    debug!(
        engine = %kind,
        engine_color = %config.engine_color,
        size = config.board_size,
        max_moves,
        "starting rollout"
    );
    match config.engine_color {
        Color::Black => play_game(board, &mut engine, &mut host, max_moves),
        Color::White => play_game(board, &mut host, &mut engine, max_moves),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::resign_action;
    use crate::engine::playout::seed_rng;
    use crate::error::Error;

    fn random_config() -> RolloutConfig {
        RolloutConfig::default()
            .with_board_size(5)
            .with_engine("random", "")
    }

    #[test]
    fn test_random_game_finishes() {
        seed_rng(11);
        let r = rollout(&random_config(), random_policy).unwrap();
        let last = r.log.current();
        assert!(last.is_terminal() || r.log.len() == 3 * 25);
        assert!(!r.result.black_resigned && !r.result.white_resigned);
        assert_eq!(r.result.margin, r.result.white_score - r.result.black_score);

        // The host plays black by default, so colors alternate from black
        for (i, t) in r.log.transitions().iter().enumerate() {
            let expected = if i % 2 == 0 { Color::Black } else { Color::White };
            assert_eq!(t.actor, expected);
        }
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let bad_engine = random_config().with_engine("gnugo", "");
        assert!(matches!(
            rollout(&bad_engine, random_policy),
            Err(Error::UnsupportedEngine(_))
        ));
        for spec in ["soon", "1e30"] {
            let bad_time = random_config().with_time_spec(spec);
            match rollout(&bad_time, random_policy) {
                Err(Error::InvalidTimeSpec(msg)) => assert!(msg.contains("=NUM")),
                other => panic!("expected InvalidTimeSpec for {spec:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_host_resignation() {
        let r = rollout(&random_config(), |b: &BoardState, _: Color| resign_action(b.size())).unwrap();
        assert!(r.log.is_empty());
        assert!(r.result.black_resigned);
        assert_eq!(r.result.winner, Some(Color::White));
    }

    #[test]
    fn test_engine_resignation_is_not_recorded() {
        seed_rng(5);
        // A montecarlo engine that resigns whenever its best winrate is below 2
        let config = random_config()
            .with_engine("montecarlo", "playouts=1,resign_threshold=2")
            .with_engine_color(Color::Black);
        let r = rollout(&config, random_policy).unwrap();
        assert!(r.log.is_empty());
        assert!(r.result.black_resigned);
        assert_eq!(r.result.winner, Some(Color::White));
    }

    #[test]
    fn test_max_moves() {
        seed_rng(3);
        let r = rollout(&random_config().with_board_size(9).with_max_moves(4), random_policy).unwrap();
        assert_eq!(r.log.len(), 4);
    }

    #[test]
    fn test_illegal_host_move_fails() {
        // Always answers the center: legal once, then occupied
        let config = random_config().with_engine_color(Color::Black);
        seed_rng(1);
        let result = rollout(&config, |_: &BoardState, _: Color| 12usize);
        assert!(matches!(result, Err(Error::IllegalMove(_))));
    }

    #[test]
    fn test_engine_tracks_every_move() {
        struct Recorder(Vec<BoardState>);
        impl Player for Recorder {
            fn choose(&mut self, board: &BoardState, color: Color) -> Result<Coord> {
                Ok(from_action(random_policy(board, color), board.size())?)
            }
            fn notify(&mut self, board: &BoardState, _mv: Move) {
                self.0.push(board.clone());
            }
        }
        seed_rng(21);
        let mut black = Recorder(Vec::new());
        let mut white = Recorder(Vec::new());
        let r = play_game(BoardState::new(5).unwrap(), &mut black, &mut white, 10).unwrap();
        let afters: Vec<_> = r.log.transitions().iter().map(|t| t.after.clone()).collect();
        assert_eq!(black.0, afters);
        assert_eq!(white.0, afters);
    }
}
