//! Flat Monte Carlo move generation.
//!
//! Every candidate move gets the same share of random playouts and the move
//! with the best winrate is chosen. No tree is kept between moves.

use crate::constants::{MC_PLAYOUTS, PASS, RESIGN, RESIGN_THRES};
use crate::coord::Coord;
use crate::engine::MoveGenerator;
use crate::engine::playout::mcplayout;
use crate::engine::position::{Color, Move, Position};
use crate::engine::time::Budget;

pub struct MonteCarlo {
    /// Playouts per candidate when no time specification is given
    pub playouts: usize,
    pub resign_threshold: f64,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self {
            playouts: MC_PLAYOUTS,
            resign_threshold: RESIGN_THRES,
        }
    }
}

struct Candidate {
    coord: Coord,
    pos: Position,
    games: u32,
    wins: u32,
}

impl Candidate {
    fn winrate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

impl MoveGenerator for MonteCarlo {
    fn genmove(&mut self, pos: &Position, color: Color, budget: &Budget) -> Coord {
        let mut candidates: Vec<Candidate> = pos
            .empty_points()
            .filter(|&pt| pos.is_eye(pt) != Some(color))
            .filter_map(|pt| {
                let mut p = pos.clone();
                p.play(Move::new(pt as Coord, color)).ok()?;
                Some(Candidate {
                    coord: pt as Coord,
                    pos: p,
                    games: 0,
                    wins: 0,
                })
            })
            .collect();
        if candidates.is_empty() {
            return PASS;
        }

        // A count budget is per candidate, so scale it by the number of candidates
        let budget = match *budget {
            Budget::Sims(n) => Budget::Sims(n.saturating_mul(candidates.len())),
            b => b,
        };

        let n = candidates.len();
        let mut i = 0;
        while !budget.exhausted(i) {
            let cand = &mut candidates[i % n];
            let mut p = cand.pos.clone();
            let score = mcplayout(&mut p, color.opponent(), None);
            let won = match color {
                Color::White => score > 0.0,
                Color::Black => score <= 0.0,
            };
            cand.games += 1;
            cand.wins += u32::from(won);
            i += 1;
        }

        let best = candidates
            .iter()
            .max_by(|a, b| {
                a.winrate()
                    .partial_cmp(&b.winrate())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|c| (c.coord, c.winrate()));
        match best {
            Some((_, wr)) if wr < self.resign_threshold => RESIGN,
            Some((coord, _)) => coord,
            None => PASS,
        }
    }

    fn default_sims(&self) -> usize {
        self.playouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_vertex;
    use crate::engine::playout::seed_rng;

    #[test]
    fn test_picks_a_legal_move() {
        seed_rng(4);
        let pos = Position::new(5);
        let mut mc = MonteCarlo::default();
        let c = mc.genmove(&pos, Color::Black, &Budget::Sims(2));
        assert!(pos.is_legal(Color::Black, c, true));
    }

    #[test]
    fn test_passes_without_candidates() {
        let mut pos = Position::new(1);
        pos.play(Move::new(PASS, Color::White)).unwrap();
        let mut mc = MonteCarlo::default();
        assert_eq!(mc.genmove(&pos, Color::Black, &Budget::Sims(2)), PASS);
    }

    #[test]
    fn test_resigns_lost_position() {
        seed_rng(8);
        let mut pos = Position::new(5);
        // White lives with three eyes on the bottom edge; even the whole
        // top area is worth less than White's area plus komi
        for v in ["A2", "B2", "C2", "D2", "E2", "B1", "D1"] {
            pos.play(Move::new(parse_vertex(v, 5).unwrap(), Color::White))
                .unwrap();
        }
        let mut mc = MonteCarlo {
            playouts: 4,
            resign_threshold: 0.5,
        };
        assert_eq!(mc.genmove(&pos, Color::Black, &Budget::Sims(4)), RESIGN);
    }
}
