//! gobridge: immutable Go board states, trajectory recording and replay.
//!
//! This crate drives a small Go engine from host code. Board positions are
//! immutable snapshots that can be shared across a game tree, moves travel
//! between three coordinate encodings, and whole games are recorded as
//! transition logs that can be stored compactly or rebuilt from SGF records.
//!
//! ## Modules
//!
//! - [`coord`] - Native, (row, col) and action-id coordinates
//! - [`state`] - Copy-on-write [`BoardState`] with scoring and feature planes
//! - [`trajectory`] - Ordered transition logs
//! - [`codec`] - Binary trajectory format
//! - [`sgf`] / [`replay`] - SGF parsing and replay into transition logs
//! - [`rollout`] - Engine versus host-policy games
//! - [`engine`] - The move generator behind it all (random, Monte Carlo, UCT)
//!
//! ## Example
//!
//! ```
//! use gobridge::{BoardState, Color, TransitionLog, codec};
//!
//! let mut log = TransitionLog::new(BoardState::new(9)?);
//! log.play(40, Color::Black)?; // E5
//! log.play(81, Color::White)?; // pass
//! assert!(!log.current().is_terminal());
//!
//! let bytes = codec::encode(std::slice::from_ref(&log))?;
//! assert_eq!(codec::decode(&bytes)?, vec![log]);
//! # Ok::<(), gobridge::Error>(())
//! ```

pub mod codec;
pub mod constants;
pub mod coord;
pub mod engine;
pub mod error;
pub mod replay;
pub mod rollout;
pub mod rules;
pub mod sgf;
pub mod state;
pub mod trajectory;

pub use engine::position::{Color, Move};
pub use error::{Error, Result};
pub use rules::Rules;
pub use state::{BoardState, Planes, ScoreMode};
pub use trajectory::{Transition, TransitionLog};
