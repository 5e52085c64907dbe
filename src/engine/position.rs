//! Go position representation and move execution.
//!
//! This module provides the rules evaluator behind every board state:
//! - Padded 1D board representation for any size up to `MAX_BOARD_SIZE`
//! - Stone placement and capture detection
//! - Ko rule enforcement and suicide detection
//! - Eye detection for playouts
//! - Fast and official counting
//!
//! Unlike a playout-only board, stones keep their real colors and either
//! color may move at any time. Callers decide turn order.

use std::fmt;

use crate::constants::{DEFAULT_KOMI, PASS, RESIGN};
use crate::coord::{Coord, column_label, stride};
use crate::rules::Rules;

/// An index into the padded 1D board array.
pub type Point = usize;

/// One of the two players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Contents of one slot of the padded board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stone {
    Empty,
    Black,
    White,
    /// Border padding.
    Out,
}

impl Stone {
    pub fn color(self) -> Option<Color> {
        match self {
            Stone::Black => Some(Color::Black),
            Stone::White => Some(Color::White),
            _ => None,
        }
    }
}

impl From<Color> for Stone {
    fn from(c: Color) -> Self {
        match c {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }
}

/// A move: a native coordinate (possibly `PASS` or `RESIGN`) and the color playing it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub coord: Coord,
    pub color: Color,
}

impl Move {
    pub fn new(coord: Coord, color: Color) -> Self {
        Self { coord, color }
    }

    pub fn is_pass(&self) -> bool {
        self.coord == PASS
    }

    pub fn is_resign(&self) -> bool {
        self.coord == RESIGN
    }
}

/// Reason a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// Point is outside the board
    OffBoard,
    /// Point is not empty
    Occupied,
    /// Move violates ko rule
    Ko,
    /// Move would be suicide (no liberties after capture resolution)
    Suicide,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::OffBoard => write!(f, "point not on board"),
            MoveError::Occupied => write!(f, "point not EMPTY"),
            MoveError::Ko => write!(f, "retakes ko"),
            MoveError::Suicide => write!(f, "suicide"),
        }
    }
}

/// Per-side tallies from counting a finished board.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Count {
    pub stones: [u32; 2],
    pub territory: [u32; 2],
    pub prisoners: [u32; 2],
}

impl Count {
    /// Points for `color` under the given rules, komi included for White.
    pub fn points(&self, color: Color, rules: Rules, komi: f32) -> f32 {
        let i = color.index();
        let base = if rules.area_scoring() {
            self.stones[i] + self.territory[i]
        } else {
            self.territory[i] + self.prisoners[i]
        };
        match color {
            Color::Black => base as f32,
            Color::White => base as f32 + komi,
        }
    }
}

/// A mutable Go position on a padded board.
#[derive(Clone, Debug)]
pub struct Position {
    size: usize,
    board: Vec<Stone>,
    /// Point the given color may not play this turn
    ko: Option<Move>,
    /// Moves played so far, passes included
    pub moves: usize,
    pub last_move: Option<Move>,
    pub last_move2: Option<Move>,
    /// Stones captured by Black and by White
    pub captures: [u32; 2],
    pub komi: f32,
    pub rules: Rules,
}

impl Position {
    /// Create an empty position. The caller is responsible for validating `size`.
    pub fn new(size: usize) -> Self {
        let w = stride(size);
        let board = (0..w * w)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (1..=size).contains(&x) && (1..=size).contains(&y) {
                    Stone::Empty
                } else {
                    Stone::Out
                }
            })
            .collect();
        Position {
            size,
            board,
            ko: None,
            moves: 0,
            last_move: None,
            last_move2: None,
            captures: [0, 0],
            komi: DEFAULT_KOMI,
            rules: Rules::default(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stone at a native coordinate; anything off the array is `Out`.
    #[inline]
    pub fn at(&self, coord: Coord) -> Stone {
        if coord < 0 {
            return Stone::Out;
        }
        self.board.get(coord as usize).copied().unwrap_or(Stone::Out)
    }

    #[inline]
    fn is_on_board(&self, coord: Coord) -> bool {
        self.at(coord) != Stone::Out
    }

    /// All on-board points in native order (bottom row first).
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.board.len()).filter(|&p| self.board[p] != Stone::Out)
    }

    /// On-board points that are empty.
    pub fn empty_points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.board.len()).filter(|&p| self.board[p] == Stone::Empty)
    }

    /// The 4 orthogonal neighbors (N, E, S, W) of a point.
    #[inline]
    pub fn neighbors(&self, pt: Point) -> [Point; 4] {
        let w = stride(self.size);
        [pt + w, pt + 1, pt - w, pt - 1]
    }

    /// The 4 diagonal neighbors (NE, SE, SW, NW) of a point.
    #[inline]
    fn diagonal_neighbors(&self, pt: Point) -> [Point; 4] {
        let w = stride(self.size);
        [pt + w + 1, pt - w + 1, pt - w - 1, pt + w - 1]
    }

    /// All 8 neighbors (4 orthogonal + 4 diagonal) of a point.
    pub fn all_neighbors(&self, pt: Point) -> [Point; 8] {
        let o = self.neighbors(pt);
        let d = self.diagonal_neighbors(pt);
        [o[0], o[1], o[2], o[3], d[0], d[1], d[2], d[3]]
    }

    /// Check if a point is "eyeish" (surrounded by stones of one color).
    ///
    /// Border neighbors are ignored. May return a color for false eyes.
    pub fn is_eyeish(&self, pt: Point) -> Option<Color> {
        let mut eyecolor = None;
        for n in self.neighbors(pt) {
            match self.board[n] {
                Stone::Out => continue,
                Stone::Empty => return None,
                s => match eyecolor {
                    None => eyecolor = s.color(),
                    Some(c) if Some(c) != s.color() => return None,
                    Some(_) => {}
                },
            }
        }
        eyecolor
    }

    /// Check if a point is a true eye.
    ///
    /// A true eye is eyeish and has at most one opponent stone on its
    /// diagonals (zero when the point is not on the edge).
    pub fn is_eye(&self, pt: Point) -> Option<Color> {
        let eyecolor = self.is_eyeish(pt)?;
        let falsecolor = Stone::from(eyecolor.opponent());
        let mut at_edge = false;
        let mut false_count = 0;

        for d in self.diagonal_neighbors(pt) {
            match self.board[d] {
                Stone::Out => at_edge = true,
                s if s == falsecolor => false_count += 1,
                _ => {}
            }
        }

        // In the center one bad diagonal is tolerated; at the edge none
        if at_edge {
            false_count += 1;
        }
        if false_count >= 2 {
            return None;
        }
        Some(eyecolor)
    }

    /// Collect all stones in the group containing `start`.
    ///
    /// Returns the number of stones in the group and appends them to `out`.
    pub fn collect_group(&self, start: Point, out: &mut Vec<Point>) -> u32 {
        let color = self.board[start];
        let mut stack = vec![start];
        let mut visited = vec![false; self.board.len()];
        let mut count = 0u32;

        while let Some(pt) = stack.pop() {
            if visited[pt] {
                continue;
            }
            visited[pt] = true;
            out.push(pt);
            count += 1;
            for n in self.neighbors(pt) {
                if !visited[n] && self.board[n] == color {
                    stack.push(n);
                }
            }
        }
        count
    }

    /// Count the liberties (distinct empty adjacent points) of the group at `start`.
    pub fn group_liberties(&self, start: Point) -> u32 {
        let color = self.board[start];
        let mut stack = vec![start];
        let mut visited = vec![false; self.board.len()];
        let mut liberty_visited = vec![false; self.board.len()];
        let mut libs = 0u32;

        while let Some(pt) = stack.pop() {
            if visited[pt] {
                continue;
            }
            visited[pt] = true;
            for n in self.neighbors(pt) {
                match self.board[n] {
                    Stone::Empty => {
                        if !liberty_visited[n] {
                            liberty_visited[n] = true;
                            libs += 1;
                        }
                    }
                    c if c == color && !visited[n] => stack.push(n),
                    _ => {}
                }
            }
        }
        libs
    }

    /// Whether `color` playing at the empty point `pt` would leave its own group without liberties.
    pub fn is_suicide(&self, color: Color, pt: Point) -> bool {
        let own = Stone::from(color);
        let opp = Stone::from(color.opponent());
        for n in self.neighbors(pt) {
            match self.board[n] {
                Stone::Empty => return false,
                s if s == opp && self.group_liberties(n) == 1 => return false,
                s if s == own && self.group_liberties(n) > 1 => return false,
                _ => {}
            }
        }
        true
    }

    fn is_ko_retake(&self, color: Color, coord: Coord) -> bool {
        self.ko == Some(Move::new(coord, color))
    }

    /// Check whether `color` may play at `coord`.
    ///
    /// Pass and resign are always legal. Without `filter_suicide` only the
    /// placement rules (point on board, empty, not a ko retake) are checked.
    pub fn is_legal(&self, color: Color, coord: Coord, filter_suicide: bool) -> bool {
        if coord == PASS || coord == RESIGN {
            return true;
        }
        if self.at(coord) != Stone::Empty || self.is_ko_retake(color, coord) {
            return false;
        }
        !(filter_suicide && self.is_suicide(color, coord as Point))
    }

    /// Native coordinates of every legal board point for `color` (pass not included).
    pub fn legal_moves(&self, color: Color, filter_suicide: bool) -> Vec<Coord> {
        self.empty_points()
            .map(|p| p as Coord)
            .filter(|&c| self.is_legal(color, c, filter_suicide))
            .collect()
    }

    fn record(&mut self, mv: Move) {
        self.moves += 1;
        self.last_move2 = self.last_move;
        self.last_move = Some(mv);
    }

    /// Play a move.
    ///
    /// Handles pass and resign, legality checking, captures and ko detection.
    /// On error the position is left unchanged.
    pub fn play(&mut self, mv: Move) -> Result<(), MoveError> {
        if mv.is_pass() || mv.is_resign() {
            if mv.is_pass() {
                self.ko = None; // Ko is cleared on pass
            }
            self.record(mv);
            return Ok(());
        }
        if !self.is_on_board(mv.coord) {
            return Err(MoveError::OffBoard);
        }
        let pt = mv.coord as Point;
        if self.board[pt] != Stone::Empty {
            return Err(MoveError::Occupied);
        }
        if self.is_ko_retake(mv.color, mv.coord) {
            return Err(MoveError::Ko);
        }

        // Playing into an enemy eye is the only way to start a ko
        let opp_color = mv.color.opponent();
        let in_enemy_eye = self.is_eyeish(pt) == Some(opp_color);
        let opp = Stone::from(opp_color);

        self.board[pt] = Stone::from(mv.color);
        let mut captured = 0u32;
        let mut capture_point: Point = 0;
        let mut group = Vec::new();

        for n in self.neighbors(pt) {
            if self.board[n] == opp && self.group_liberties(n) == 0 {
                group.clear();
                captured += self.collect_group(n, &mut group);
                for &s in &group {
                    self.board[s] = Stone::Empty;
                }
                capture_point = n;
            }
        }

        if captured == 0 && self.group_liberties(pt) == 0 {
            self.board[pt] = Stone::Empty;
            return Err(MoveError::Suicide);
        }

        self.ko = if captured == 1 && in_enemy_eye {
            Some(Move::new(capture_point as Coord, opp_color))
        } else {
            None
        };
        self.captures[mv.color.index()] += captured;
        self.record(mv);
        Ok(())
    }

    /// Remove the whole group at `pt`, crediting its stones to the opponent as prisoners.
    fn remove_group(&mut self, pt: Point, count: &mut Count) {
        let Some(color) = self.board[pt].color() else {
            return;
        };
        let mut group = Vec::new();
        let n = self.collect_group(pt, &mut group);
        for s in group {
            self.board[s] = Stone::Empty;
        }
        count.prisoners[color.opponent().index()] += n;
    }

    /// Quick area estimate: stones plus one-point eyes, from White's point of view.
    pub fn fast_score(&self) -> f32 {
        let mut tally = [0i32; 2];
        for pt in self.points() {
            let owner = match self.board[pt] {
                Stone::Empty => self.is_eyeish(pt),
                s => s.color(),
            };
            if let Some(c) = owner {
                tally[c.index()] += 1;
            }
        }
        self.komi + (tally[1] - tally[0]) as f32
    }

    /// Count the board after removing the groups containing `dead` points.
    ///
    /// Empty regions bordered by a single color are that color's territory.
    pub fn count(&self, dead: &[Coord]) -> Count {
        let mut board = self.clone();
        let mut count = Count {
            prisoners: self.captures,
            ..Count::default()
        };
        for &d in dead {
            if d >= 0 && (d as usize) < board.board.len() {
                board.remove_group(d as Point, &mut count);
            }
        }

        let mut visited = vec![false; board.board.len()];
        let mut region = Vec::new();
        for pt in board.points().collect::<Vec<_>>() {
            if let Some(c) = board.board[pt].color() {
                count.stones[c.index()] += 1;
                continue;
            }
            if visited[pt] {
                continue;
            }
            region.clear();
            let mut borders = [false; 2];
            let mut stack = vec![pt];
            visited[pt] = true;
            while let Some(p) = stack.pop() {
                region.push(p);
                for n in board.neighbors(p) {
                    match board.board[n] {
                        Stone::Empty if !visited[n] => {
                            visited[n] = true;
                            stack.push(n);
                        }
                        Stone::Black => borders[0] = true,
                        Stone::White => borders[1] = true,
                        _ => {}
                    }
                }
            }
            match borders {
                [true, false] => count.territory[0] += region.len() as u32,
                [false, true] => count.territory[1] += region.len() as u32,
                _ => {}
            }
        }
        count
    }

    /// Final margin from White's point of view after removing `dead` groups.
    pub fn official_score(&self, dead: &[Coord]) -> f32 {
        let count = self.count(dead);
        count.points(Color::White, self.rules, self.komi)
            - count.points(Color::Black, self.rules, self.komi)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size;
        let last = self.last_move.map(|m| m.coord);
        writeln!(
            f,
            "Move: {:>3}  Komi: {:.1}  Rules: {}  Captures B: {} W: {}",
            self.moves, self.komi, self.rules, self.captures[0], self.captures[1]
        )?;
        write!(f, "   ")?;
        for col in 0..n {
            write!(f, " {}", column_label(col))?;
        }
        writeln!(f)?;
        let w = stride(n);
        for y in (1..=n).rev() {
            write!(f, "{y:>2} ")?;
            for x in 1..=n {
                let pt = x + y * w;
                let ch = match self.board[pt] {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    _ => '.',
                };
                let sep = if last == Some(pt as Coord) { '(' } else { ' ' };
                write!(f, "{sep}{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_vertex;

    fn play(pos: &mut Position, color: Color, v: &str) -> Result<(), MoveError> {
        let c = parse_vertex(v, pos.size()).unwrap();
        pos.play(Move::new(c, color))
    }

    fn stone(pos: &Position, v: &str) -> Stone {
        pos.at(parse_vertex(v, pos.size()).unwrap())
    }

    #[test]
    fn test_empty_position() {
        let pos = Position::new(9);
        assert_eq!(pos.points().count(), 81);
        assert_eq!(pos.empty_points().count(), 81);
        assert_eq!(pos.moves, 0);
        assert_eq!(stone(&pos, "E5"), Stone::Empty);
        assert_eq!(pos.at(0), Stone::Out);
    }

    #[test]
    fn test_play_move_basic() {
        let mut pos = Position::new(9);
        play(&mut pos, Color::Black, "D4").unwrap();
        assert_eq!(pos.moves, 1);
        assert_eq!(stone(&pos, "D4"), Stone::Black);
        assert_eq!(pos.last_move.unwrap().color, Color::Black);
    }

    #[test]
    fn test_group_liberties() {
        let mut pos = Position::new(9);
        play(&mut pos, Color::Black, "D4").unwrap();
        let pt = parse_vertex("D4", 9).unwrap() as Point;
        assert_eq!(pos.group_liberties(pt), 4, "Single stone should have 4 liberties");
        play(&mut pos, Color::Black, "A1").unwrap();
        let corner = parse_vertex("A1", 9).unwrap() as Point;
        assert_eq!(pos.group_liberties(corner), 2);
    }

    #[test]
    fn test_occupied_is_rejected() {
        let mut pos = Position::new(9);
        play(&mut pos, Color::White, "C3").unwrap();
        assert_eq!(play(&mut pos, Color::Black, "C3"), Err(MoveError::Occupied));
        assert_eq!(pos.moves, 1);
    }

    #[test]
    fn test_suicide_single_stone() {
        let mut pos = Position::new(9);
        play(&mut pos, Color::Black, "A2").unwrap();
        play(&mut pos, Color::Black, "B1").unwrap();
        assert!(pos.is_suicide(Color::White, parse_vertex("A1", 9).unwrap() as Point));
        assert!(!pos.is_legal(Color::White, parse_vertex("A1", 9).unwrap(), true));
        assert!(pos.is_legal(Color::White, parse_vertex("A1", 9).unwrap(), false));
        assert_eq!(play(&mut pos, Color::White, "A1"), Err(MoveError::Suicide));
        assert_eq!(stone(&pos, "A1"), Stone::Empty);
    }

    #[test]
    fn test_capture_group_counts_once() {
        let mut pos = Position::new(9);
        // White pair D4 D5 surrounded on all sides
        for v in ["D4", "D5"] {
            play(&mut pos, Color::White, v).unwrap();
        }
        for v in ["C4", "C5", "E4", "E5", "D3"] {
            play(&mut pos, Color::Black, v).unwrap();
        }
        play(&mut pos, Color::Black, "D6").unwrap();
        assert_eq!(stone(&pos, "D4"), Stone::Empty);
        assert_eq!(stone(&pos, "D5"), Stone::Empty);
        assert_eq!(pos.captures, [2, 0]);
    }

    #[test]
    fn test_simple_ko() {
        let mut pos = Position::new(9);
        //   A B C D
        // 3 . X O .
        // 2 X O . O
        // 1 . X O .
        for v in ["B3", "A2", "B1"] {
            play(&mut pos, Color::Black, v).unwrap();
        }
        for v in ["C3", "D2", "C1", "B2"] {
            play(&mut pos, Color::White, v).unwrap();
        }
        // Black captures B2 by playing C2
        play(&mut pos, Color::Black, "C2").unwrap();
        assert_eq!(stone(&pos, "B2"), Stone::Empty);
        // White may not retake immediately
        assert_eq!(play(&mut pos, Color::White, "B2"), Err(MoveError::Ko));
        assert!(!pos.is_legal(Color::White, parse_vertex("B2", 9).unwrap(), false));
        // After a pass the ko is lifted
        pos.play(Move::new(PASS, Color::White)).unwrap();
        pos.play(Move::new(PASS, Color::Black)).unwrap();
        play(&mut pos, Color::White, "B2").unwrap();
        assert_eq!(stone(&pos, "C2"), Stone::Empty);
    }

    #[test]
    fn test_is_eye() {
        let mut pos = Position::new(9);
        assert_eq!(pos.is_eye(parse_vertex("A1", 9).unwrap() as Point), None);
        play(&mut pos, Color::Black, "A2").unwrap();
        play(&mut pos, Color::Black, "B1").unwrap();
        let a1 = parse_vertex("A1", 9).unwrap() as Point;
        assert_eq!(pos.is_eyeish(a1), Some(Color::Black));
        assert_eq!(pos.is_eye(a1), Some(Color::Black));
        play(&mut pos, Color::White, "B2").unwrap();
        assert_eq!(pos.is_eye(a1), None, "corner eye with a bad diagonal is false");
    }

    #[test]
    fn test_count_area_and_territory() {
        let mut pos = Position::new(5);
        // Black wall on column B, White wall on column D
        for r in 1..=5 {
            play(&mut pos, Color::Black, &format!("B{r}")).unwrap();
            play(&mut pos, Color::White, &format!("D{r}")).unwrap();
        }
        let count = pos.count(&[]);
        assert_eq!(count.stones, [5, 5]);
        assert_eq!(count.territory, [5, 5]);
        assert_eq!(pos.official_score(&[]), pos.komi);

        pos.rules = Rules::Japanese;
        assert_eq!(pos.official_score(&[]), pos.komi);
    }

    #[test]
    fn test_count_removes_dead_groups() {
        let mut pos = Position::new(5);
        play(&mut pos, Color::White, "C3").unwrap();
        let dead = parse_vertex("C3", 5).unwrap();
        let count = pos.count(&[dead]);
        assert_eq!(count.stones, [0, 0]);
        assert_eq!(count.prisoners, [1, 0]);
    }

    #[test]
    fn test_display_marks_board() {
        let mut pos = Position::new(5);
        play(&mut pos, Color::Black, "C3").unwrap();
        let s = pos.to_string();
        assert!(s.contains("A B C D E"));
        assert!(s.contains("(X"));
    }
}
