//! Immutable board states.
//!
//! A [`BoardState`] is a frozen engine position behind an `Arc`. Cloning a
//! state only bumps a reference count; every transition clones the position,
//! applies one move to the private copy and freezes the result. A state is
//! never changed after it has been handed out, so snapshots can be shared
//! freely across a game tree.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::constants::{MAX_BOARD_SIZE, PASS, RESIGN};
use crate::coord::{
    ActionId, Coord, from_action, from_rowcol, pass_action, to_action, to_rowcol, vertex_str,
};
use crate::engine::playout::{choose_random_move, judge_dead_groups};
use crate::engine::position::{Color, Count, Move, Position, Stone};
use crate::error::{Error, Result};
use crate::rules::Rules;

/// How to score a position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScoreMode {
    /// Stones plus one-point eyes, O(board area)
    Fast,
    /// Dead groups removed by ownership judgement, then full counting
    Official,
}

/// Number of feature planes produced by [`BoardState::encode`].
pub const PLANES: usize = 3;

/// Feature planes indexed `[channel][row][col]`: black, white, empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Planes {
    channels: usize,
    size: usize,
    data: Vec<u8>,
}

impl Planes {
    pub fn zeros(channels: usize, size: usize) -> Self {
        Self {
            channels,
            size,
            data: vec![0; channels * size * size],
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.size, self.size]
    }

    /// Value at `[channel][row][col]`, or `None` outside the shape.
    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<u8> {
        if channel >= self.channels || row >= self.size || col >= self.size {
            return None;
        }
        Some(self.data[(channel * self.size + row) * self.size + col])
    }

    fn set(&mut self, channel: usize, row: usize, col: usize, v: u8) {
        self.data[(channel * self.size + row) * self.size + col] = v;
    }

    /// Flat row-major view, channel-major first.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// A Go position that never changes once built.
#[derive(Clone)]
pub struct BoardState {
    pos: Arc<Position>,
}

impl BoardState {
    /// Create an empty board of the given size.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(Error::InvalidSize {
                size,
                max: MAX_BOARD_SIZE,
            });
        }
        Ok(Self::from_position(Position::new(size)))
    }

    pub fn from_position(pos: Position) -> Self {
        Self { pos: Arc::new(pos) }
    }

    /// A copy that shares nothing with `self`.
    ///
    /// Plain `clone()` is already logically independent, because states are
    /// never mutated; this additionally duplicates the storage.
    pub fn deep_clone(&self) -> Self {
        Self::from_position((*self.pos).clone())
    }

    /// Derive a new state by mutating a private copy of the position.
    fn derive(&self, f: impl FnOnce(&mut Position) -> Result<()>) -> Result<Self> {
        let mut pos = (*self.pos).clone();
        f(&mut pos)?;
        Ok(Self::from_position(pos))
    }

    /// The engine position behind this state.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    pub fn size(&self) -> usize {
        self.pos.size()
    }

    pub fn rules(&self) -> Rules {
        self.pos.rules
    }

    pub fn komi(&self) -> f32 {
        self.pos.komi
    }

    /// Moves played so far, passes and setup stones included.
    pub fn move_count(&self) -> usize {
        self.pos.moves
    }

    pub fn last_move(&self) -> Option<Move> {
        self.pos.last_move
    }

    pub fn last_move2(&self) -> Option<Move> {
        self.pos.last_move2
    }

    /// Same position under a different rule set.
    pub fn with_rules(&self, rules: Rules) -> Self {
        let mut pos = (*self.pos).clone();
        pos.rules = rules;
        Self::from_position(pos)
    }

    /// Same position with a different komi.
    pub fn with_komi(&self, komi: f32) -> Self {
        let mut pos = (*self.pos).clone();
        pos.komi = komi;
        Self::from_position(pos)
    }

    /// Stone at `(row, col)`, `None` for an empty point.
    pub fn at(&self, row: usize, col: usize) -> Result<Option<Color>> {
        let c = from_rowcol(row, col, self.size())?;
        Ok(self.pos.at(c).color())
    }

    /// All `(row, col)` points holding a stone of `color`, in row-major order.
    pub fn stones(&self, color: Color) -> Vec<(usize, usize)> {
        let n = self.size();
        let mut out: Vec<_> = self
            .pos
            .points()
            .filter(|&p| self.pos.at(p as Coord).color() == Some(color))
            .filter_map(|p| to_rowcol(p as Coord, n).ok())
            .collect();
        out.sort_unstable();
        out
    }

    /// Legal action ids for `color`, ascending, always including pass.
    ///
    /// Without `filter_suicide` only occupied points and an immediate ko
    /// retake are excluded.
    pub fn legal_actions(&self, color: Color, filter_suicide: bool) -> Vec<ActionId> {
        let n = self.size();
        let mut out: Vec<ActionId> = self
            .pos
            .legal_moves(color, filter_suicide)
            .into_iter()
            .filter_map(|c| to_action(c, n).ok())
            .collect();
        out.sort_unstable();
        out.push(pass_action(n));
        out
    }

    /// Play an action id for `color`, returning the new state.
    pub fn play(&self, action: ActionId, color: Color) -> Result<Self> {
        let coord = from_action(action, self.size())?;
        self.play_native(coord, color)
    }

    /// Play a native coordinate (or `PASS` / `RESIGN`) for `color`.
    pub fn play_native(&self, coord: Coord, color: Color) -> Result<Self> {
        self.derive(|pos| {
            pos.play(Move::new(coord, color)).map_err(|e| {
                Error::IllegalMove(format!(
                    "Illegal move by {color} at {} ({e}). Current board:\n{}",
                    vertex_str(coord, self.size()),
                    self.pos
                ))
            })
        })
    }

    /// Play a random legal move for `color` that does not fill one of its own
    /// eyes, or pass when no such move is left. Returns the new state and
    /// the action that was played.
    pub fn play_random(&self, color: Color) -> Result<(Self, ActionId)> {
        let coord = choose_random_move(&self.pos, color).unwrap_or(PASS);
        let next = self.play_native(coord, color)?;
        Ok((next, to_action(coord, self.size())?))
    }

    /// A game is over after a resignation or two passes in a row by both colors.
    pub fn is_terminal(&self) -> bool {
        match (self.pos.last_move, self.pos.last_move2) {
            (Some(m), _) if m.coord == RESIGN => true,
            (Some(m1), Some(m2)) => m1.coord == PASS && m2.coord == PASS && m1.color != m2.color,
            _ => false,
        }
    }

    /// Score from White's point of view (positive when White wins), komi included.
    pub fn score(&self, mode: ScoreMode) -> f32 {
        match mode {
            ScoreMode::Fast => self.pos.fast_score(),
            ScoreMode::Official => self.pos.official_score(&judge_dead_groups(&self.pos)),
        }
    }

    /// Per-side tallies behind [`score`](Self::score).
    pub fn area(&self, mode: ScoreMode) -> Count {
        match mode {
            ScoreMode::Fast => self.pos.count(&[]),
            ScoreMode::Official => self.pos.count(&judge_dead_groups(&self.pos)),
        }
    }

    /// Encode the board as black / white / empty planes.
    pub fn encode(&self) -> Planes {
        let mut planes = Planes::zeros(PLANES, self.size());
        self.fill(&mut planes);
        planes
    }

    /// Encode into a caller-supplied buffer, which must have shape `[3, N, N]`.
    pub fn encode_into(&self, out: &mut Planes) -> Result<()> {
        let n = self.size();
        let expected = [PLANES, n, n];
        if out.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: out.shape(),
            });
        }
        self.fill(out);
        Ok(())
    }

    fn fill(&self, planes: &mut Planes) {
        let n = self.size();
        for row in 0..n {
            for col in 0..n {
                let channel = match self.cell(row, col) {
                    Stone::Black => 0,
                    Stone::White => 1,
                    _ => 2,
                };
                for c in 0..PLANES {
                    planes.set(c, row, col, u8::from(c == channel));
                }
            }
        }
    }

    fn cell(&self, row: usize, col: usize) -> Stone {
        from_rowcol(row, col, self.size()).map_or(Stone::Out, |c| self.pos.at(c))
    }

    /// Logical cells in row-major order.
    fn cells(&self) -> impl Iterator<Item = Stone> + '_ {
        let n = self.size();
        (0..n * n).map(move |i| self.cell(i / n, i % n))
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.pos, &other.pos) {
            return true;
        }
        self.size() == other.size() && self.cells().eq(other.cells())
    }
}

impl Eq for BoardState {}

impl Hash for BoardState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size().hash(state);
        for c in self.cells() {
            c.hash(state);
        }
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pos)
    }
}

impl fmt::Debug for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardState")
            .field("size", &self.size())
            .field("moves", &self.move_count())
            .field("last_move", &self.last_move())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::playout::seed_rng;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(b: &BoardState) -> u64 {
        let mut h = DefaultHasher::new();
        b.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_create_sizes() {
        assert!(BoardState::new(0).is_err());
        assert!(BoardState::new(26).is_err());
        for n in [2, 5, 8, 9, 19, 25] {
            let b = BoardState::new(n).unwrap();
            assert_eq!(b.size(), n);
            assert_eq!(
                b.legal_actions(Color::Black, true).len(),
                n * n + 1,
                "empty board should allow every point plus pass"
            );
        }
    }

    #[test]
    fn test_play_does_not_mutate_receiver() {
        let b = BoardState::new(9).unwrap();
        let next = b.play(40, Color::Black).unwrap();
        assert_eq!(b.at(4, 4).unwrap(), None);
        assert_eq!(next.at(4, 4).unwrap(), Some(Color::Black));
        assert_eq!(b.move_count(), 0);
        assert_eq!(next.move_count(), 1);
    }

    #[test]
    fn test_clone_equality_and_independence() {
        let b = BoardState::new(9).unwrap().play(10, Color::White).unwrap();
        let shallow = b.clone();
        let deep = b.deep_clone();
        assert_eq!(b, shallow);
        assert_eq!(b, deep);
        assert_eq!(hash_of(&b), hash_of(&deep));

        let played = deep.play(20, Color::Black).unwrap();
        assert_ne!(played, b);
        assert_eq!(b.at(2, 2).unwrap(), None);
        assert_eq!(deep.at(2, 2).unwrap(), None);
    }

    #[test]
    fn test_equality_ignores_history_and_size() {
        let a = BoardState::new(9).unwrap();
        let passed = a.play(81, Color::Black).unwrap();
        assert_eq!(a, passed, "equality is cell-by-cell only");
        assert_ne!(a, BoardState::new(13).unwrap());
    }

    #[test]
    fn test_occupied_point_is_illegal() {
        let b = BoardState::new(9).unwrap().play(40, Color::Black).unwrap();
        match b.play(40, Color::White) {
            Err(Error::IllegalMove(msg)) => {
                assert!(msg.contains("Illegal move by white at E5"), "{msg}");
                assert!(msg.contains("Current board"));
            }
            other => panic!("expected IllegalMove, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_action() {
        let b = BoardState::new(9).unwrap();
        assert!(matches!(b.play(83, Color::Black), Err(Error::OutOfRange { .. })));
        assert!(matches!(b.at(9, 0), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_legal_actions_exclude_occupied_and_suicide() {
        // 5x5: black A2 (15) and B1 (21) make A1 (20) suicide for White
        let b = BoardState::new(5)
            .unwrap()
            .play(15, Color::Black)
            .unwrap()
            .play(21, Color::Black)
            .unwrap();
        let unfiltered = b.legal_actions(Color::White, false);
        let filtered = b.legal_actions(Color::White, true);
        assert!(!unfiltered.contains(&15) && !unfiltered.contains(&21));
        assert!(unfiltered.contains(&20));
        assert!(!filtered.contains(&20));
        assert_eq!(*filtered.last().unwrap(), 25, "pass comes last");
    }

    #[test]
    fn test_terminal_detection() {
        let b = BoardState::new(9).unwrap();
        assert!(!b.is_terminal());
        let one_pass = b.play(81, Color::Black).unwrap();
        assert!(!one_pass.is_terminal());
        let two_passes = one_pass.play(81, Color::White).unwrap();
        assert!(two_passes.is_terminal());

        let pass_then_move = one_pass.play(40, Color::White).unwrap();
        assert!(!pass_then_move.is_terminal());

        let resigned = b.play(82, Color::White).unwrap();
        assert!(resigned.is_terminal());
    }

    #[test]
    fn test_same_color_double_pass_is_not_terminal() {
        let b = BoardState::new(9)
            .unwrap()
            .play(81, Color::Black)
            .unwrap()
            .play(81, Color::Black)
            .unwrap();
        assert!(!b.is_terminal());
    }

    #[test]
    fn test_encode_planes() {
        let b = BoardState::new(9)
            .unwrap()
            .play(40, Color::Black)
            .unwrap()
            .play(0, Color::White)
            .unwrap();
        let p = b.encode();
        assert_eq!(p.shape(), [3, 9, 9]);
        assert_eq!(p.get(0, 4, 4), Some(1));
        assert_eq!(p.get(2, 4, 4), Some(0));
        assert_eq!(p.get(1, 0, 0), Some(1));
        assert_eq!(p.get(2, 8, 8), Some(1));
        assert_eq!(p.get(3, 0, 0), None);
        assert_eq!(p.get(0, 9, 0), None);
        assert_eq!(p.get(0, 0, 9), None);
        let total: u32 = p.as_slice().iter().map(|&v| v as u32).sum();
        assert_eq!(total, 81, "exactly one plane is set per point");
    }

    #[test]
    fn test_encode_into_checks_shape() {
        let b = BoardState::new(9).unwrap();
        let mut wrong = Planes::zeros(3, 13);
        assert!(matches!(
            b.encode_into(&mut wrong),
            Err(Error::ShapeMismatch { expected: [3, 9, 9], got: [3, 13, 13] })
        ));
        let mut right = Planes::zeros(3, 9);
        b.encode_into(&mut right).unwrap();
        assert_eq!(right, b.encode());
    }

    #[test]
    fn test_stones_listing() {
        let b = BoardState::new(9)
            .unwrap()
            .play(80, Color::White)
            .unwrap()
            .play(1, Color::White)
            .unwrap();
        assert_eq!(b.stones(Color::White), vec![(0, 1), (8, 8)]);
        assert!(b.stones(Color::Black).is_empty());
    }

    #[test]
    fn test_scores() {
        seed_rng(1);
        let b = BoardState::new(9).unwrap();
        assert_eq!(b.score(ScoreMode::Fast), b.komi());
        assert_eq!(b.score(ScoreMode::Official), b.komi());
        let japanese = b.with_rules(Rules::Japanese).with_komi(0.5);
        assert_eq!(japanese.rules(), Rules::Japanese);
        assert_eq!(japanese.score(ScoreMode::Fast), 0.5);
    }

    #[test]
    fn test_play_random_moves() {
        seed_rng(7);
        let mut board = BoardState::new(5).unwrap();
        let mut color = Color::Black;
        for _ in 0..12 {
            let (next, action) = board.play_random(color).unwrap();
            assert!(board.legal_actions(color, true).contains(&action));
            if action != pass_action(5) {
                assert_eq!(next.at(action / 5, action % 5).unwrap(), Some(color));
                assert_eq!(board.at(action / 5, action % 5).unwrap(), None, "receiver unchanged");
            }
            board = next;
            color = color.opponent();
        }
    }

    #[test]
    fn test_play_random_passes_when_stuck() {
        // The only point on a 1x1 board is suicide
        let board = BoardState::new(1).unwrap();
        let (next, action) = board.play_random(Color::Black).unwrap();
        assert_eq!(action, pass_action(1));
        assert_eq!(next.last_move().map(|m| m.coord), Some(PASS));
    }
}
