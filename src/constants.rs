//! Engine parameters and fixed values.
//!
//! Board size is a run-time property of every position. The native layout
//! surrounds the N x N playing area with a single border line on each side,
//! so a board of size N occupies `(N + 2)^2` slots.

// ---- Boards and games -------------------------------------------------------

/// Largest supported board size.
pub const MAX_BOARD_SIZE: usize = 25;

/// Board size assumed by game records that do not declare one.
pub const DEFAULT_BOARD_SIZE: usize = 19;

pub const DEFAULT_KOMI: f32 = 7.5;

/// Games are cut off after `GAME_LEN_FACTOR * N * N` moves.
pub const GAME_LEN_FACTOR: usize = 3;

/// Native coordinate of a pass.
pub const PASS: i32 = -1;

/// Native coordinate of a resignation.
pub const RESIGN: i32 = -2;

// ---- Search -----------------------------------------------------------------

/// Simulations per move when no time specification is given.
pub const N_SIMS: usize = 1400;

/// Visits at which AMAF and real statistics weigh the same in selection.
pub const RAVE_EQUIV: usize = 3500;

/// A tree node grows children once it has this many visits.
pub const EXPAND_VISITS: u32 = 8;

/// Resign when the best winrate falls below this.
pub const RESIGN_THRES: f64 = 0.2;

/// Stop early above this winrate after a fifth of the budget.
pub const FASTPLAY20_THRES: f64 = 0.8;

/// Stop early above this winrate after a twentieth of the budget.
pub const FASTPLAY5_THRES: f64 = 0.95;

/// Playouts per candidate move for the flat Monte Carlo engine.
pub const MC_PLAYOUTS: usize = 8;

// ---- Priors for new tree nodes (visits, added to wins where favorable) -----

/// Every child starts with this many visits and half as many wins.
pub const PRIOR_EVEN: u32 = 10;

pub const PRIOR_CAPTURE_ONE: u32 = 15;
pub const PRIOR_CAPTURE_MANY: u32 = 30;

/// Indexed by common-fate-graph distance to the last move, minus one.
pub const PRIOR_CFG: [u32; 3] = [24, 22, 8];

/// Visits without wins for first and second line moves far from any stone.
pub const PRIOR_EMPTYAREA: u32 = 10;

// ---- Dead group judgement ---------------------------------------------------

/// Share of playouts the opponent must own a group's points for it to be dead.
pub const GJ_THRES: f64 = 0.8;

/// Playouts sampled to build the ownership map.
pub const GJ_PLAYOUTS: usize = 500;
