//! Monte Carlo playouts (random game simulation) and dead group judgement.
//!
//! A playout plays random legal moves until both sides pass or the game
//! length limit is reached, then counts the board. Repeating playouts from
//! one position gives an ownership map, from which groups that usually die
//! are declared dead for official scoring.

use tracing::trace;

use crate::constants::{GAME_LEN_FACTOR, GJ_PLAYOUTS, GJ_THRES, PASS};
use crate::coord::Coord;
use crate::engine::position::{Color, Move, Point, Position, Stone};

/// Seed the generator used by playouts and the random engine.
///
/// The generator is thread-local; seed it on the thread that plays.
pub fn seed_rng(seed: u64) {
    fastrand::seed(seed);
}

/// Choose a random legal move for `color` that does not fill one of its own true eyes.
///
/// Candidates are tried in random order so that suicides are skipped
/// without scanning the whole board twice.
pub fn choose_random_move(pos: &Position, color: Color) -> Option<Coord> {
    let mut candidates: Vec<Point> = pos
        .empty_points()
        .filter(|&pt| pos.is_eye(pt) != Some(color))
        .collect();

    let n = candidates.len();
    for i in 0..n {
        // Pick a random remaining candidate
        let j = fastrand::usize(i..n);
        candidates.swap(i, j);

        let c = candidates[i] as Coord;
        if pos.is_legal(color, c, true) {
            return Some(c);
        }
    }
    None
}

/// Color to move after the last recorded move (Black on an empty history).
pub fn next_to_move(pos: &Position) -> Color {
    pos.last_move.map_or(Color::Black, |m| m.color.opponent())
}

/// Perform a random playout from `pos` with `to_move` playing first.
///
/// When `amaf` is given, the first color to play each point is recorded in
/// it (1 = black, 2 = white). Returns the fast score of the final position,
/// positive when White is ahead.
pub fn mcplayout(pos: &mut Position, to_move: Color, mut amaf: Option<&mut [u8]>) -> f32 {
    let limit = GAME_LEN_FACTOR * pos.size() * pos.size();
    let mut passes = 0;
    let mut color = to_move;

    while passes < 2 && pos.moves < limit {
        match choose_random_move(pos, color) {
            Some(c) if pos.play(Move::new(c, color)).is_ok() => {
                if let Some(map) = amaf.as_deref_mut() {
                    let slot = &mut map[c as usize];
                    if *slot == 0 {
                        *slot = if color == Color::Black { 1 } else { 2 };
                    }
                }
                passes = 0;
            }
            _ => {
                let _ = pos.play(Move::new(PASS, color));
                passes += 1;
            }
        }
        color = color.opponent();
    }

    pos.fast_score()
}

/// How often each point ended up owned by each color over a set of playouts.
pub struct OwnerMap {
    playouts: u32,
    owners: Vec<[u32; 2]>,
}

impl OwnerMap {
    /// Sample `playouts` random games from `pos`.
    pub fn sample(pos: &Position, playouts: usize) -> Self {
        let to_move = next_to_move(pos);
        let slots = crate::coord::stride(pos.size()).pow(2);
        let mut owners = vec![[0u32; 2]; slots];

        for _ in 0..playouts {
            let mut p = pos.clone();
            mcplayout(&mut p, to_move, None);
            for pt in p.points() {
                let owner = match p.at(pt as Coord) {
                    Stone::Empty => p.is_eyeish(pt),
                    s => s.color(),
                };
                if let Some(c) = owner {
                    owners[pt][c.index()] += 1;
                }
            }
        }
        trace!(playouts, "sampled ownership map");
        OwnerMap {
            playouts: playouts as u32,
            owners,
        }
    }

    /// Fraction of playouts in which `color` owned `pt`.
    pub fn share(&self, pt: Point, color: Color) -> f64 {
        if self.playouts == 0 {
            return 0.0;
        }
        self.owners[pt][color.index()] as f64 / self.playouts as f64
    }

    /// One stone of every group whose points the opponent owns with at least `thres` share.
    pub fn dead_groups(&self, pos: &Position, thres: f64) -> Vec<Coord> {
        let mut seen = vec![false; self.owners.len()];
        let mut dead = Vec::new();
        let mut group = Vec::new();

        for pt in pos.points() {
            let Some(color) = pos.at(pt as Coord).color() else {
                continue;
            };
            if seen[pt] {
                continue;
            }
            group.clear();
            pos.collect_group(pt, &mut group);
            let opp_share: f64 = group
                .iter()
                .map(|&s| self.share(s, color.opponent()))
                .sum::<f64>()
                / group.len() as f64;
            for &s in &group {
                seen[s] = true;
            }
            if opp_share >= thres {
                dead.push(pt as Coord);
            }
        }
        dead
    }
}

/// Statistical dead group judgement with the engine's fixed threshold.
pub fn judge_dead_groups(pos: &Position) -> Vec<Coord> {
    OwnerMap::sample(pos, GJ_PLAYOUTS).dead_groups(pos, GJ_THRES)
}
