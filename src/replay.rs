//! Replaying SGF game records into transition logs.
//!
//! The root node is read as the game header (`SZ`, `HA`, `KM`, `AB`, `AW`,
//! `RU`). Setup stones are placed before the first transition and are not
//! recorded. Every later node on the main line must hold one move.
//!
//! Turn order is guessed: the color expected to move is tried first and the
//! other color once if that property is missing. Handicap games start with
//! White, since handicap stones arrive as setup stones.

use tracing::{debug, warn};

use crate::constants::{DEFAULT_BOARD_SIZE, PASS};
use crate::coord::{Coord, parse_vertex, to_action};
use crate::engine::position::Color;
use crate::error::{Error, Result};
use crate::rules::{Rules, normalize};
use crate::sgf::{self, GameTree, Node};
use crate::state::BoardState;
use crate::trajectory::TransitionLog;

/// Header of a game record.
#[derive(Clone, Debug, PartialEq)]
pub struct GameInfo {
    pub size: usize,
    pub handicap: u32,
    /// Parsed but not applied; boards keep the engine komi.
    pub komi: Option<f32>,
    /// Rule-set name as written in the record.
    pub rules: Option<String>,
    pub black_setup: Vec<Coord>,
    pub white_setup: Vec<Coord>,
}

/// A replayed game record.
#[derive(Clone, Debug)]
pub struct Replay {
    pub info: GameInfo,
    pub log: TransitionLog,
}

/// Translate an SGF point (`"dd"`) to a native coordinate.
///
/// Goes through GTP vertex text: SGF letters run `a..` without gaps, GTP
/// column letters skip `I`. An empty value is a pass, and so is `tt` on
/// boards of 19 or less.
pub fn sgf_point(value: &str, size: usize) -> Result<Coord> {
    if value.is_empty() || (value == "tt" && size <= 19) {
        return Ok(PASS);
    }
    let b = value.as_bytes();
    if b.len() != 2 || !b.iter().all(u8::is_ascii_lowercase) {
        return Err(Error::out_of_range(value, size));
    }
    let (col, row) = ((b[0] - b'a') as usize, (b[1] - b'a') as usize);
    if col >= size || row >= size {
        return Err(Error::out_of_range(value, size));
    }
    let mut letter = b[0];
    if letter >= b'i' {
        letter += 1;
    }
    let vertex = format!("{}{}", letter.to_ascii_uppercase() as char, size - row);
    parse_vertex(&vertex, size)
}

/// Expand a point list value, including `aa:cc` rectangles.
fn sgf_points(values: &[String], size: usize, out: &mut Vec<Coord>) -> Result<()> {
    for v in values {
        match v.split_once(':') {
            None => out.push(sgf_point(v, size)?),
            Some((a, b)) => {
                let (a, b) = (a.as_bytes(), b.as_bytes());
                if a.len() != 2 || b.len() != 2 {
                    return Err(Error::out_of_range(v, size));
                }
                for c in a[0].min(b[0])..=a[0].max(b[0]) {
                    for r in a[1].min(b[1])..=a[1].max(b[1]) {
                        let p = [c, r];
                        out.push(sgf_point(&String::from_utf8_lossy(&p), size)?);
                    }
                }
            }
        }
    }
    Ok(())
}

fn header_error(root: &Node) -> Error {
    Error::UnrecognizedNode {
        index: 0,
        node: root.to_string(),
    }
}

impl GameInfo {
    /// Read the header properties of `root`.
    pub fn from_root(root: &Node) -> Result<Self> {
        let size = match root.first("SZ") {
            None => DEFAULT_BOARD_SIZE,
            // Rectangular boards ("19:13") are not supported
            Some(s) => s.trim().parse().map_err(|_| header_error(root))?,
        };
        let handicap = match root.first("HA") {
            None => 0,
            Some(s) => s.trim().parse().map_err(|_| header_error(root))?,
        };
        let komi = root.first("KM").and_then(|s| s.trim().parse().ok());
        let rules = root.first("RU").map(str::to_string);

        let mut black_setup = Vec::new();
        let mut white_setup = Vec::new();
        if let Some(v) = root.get("AB") {
            sgf_points(v, size, &mut black_setup)?;
        }
        if let Some(v) = root.get("AW") {
            sgf_points(v, size, &mut white_setup)?;
        }

        Ok(GameInfo {
            size,
            handicap,
            komi,
            rules,
            black_setup,
            white_setup,
        })
    }

    /// Rule set to play under; unknown names fall back to the default.
    pub fn rule_set(&self) -> Rules {
        let Some(name) = &self.rules else {
            return Rules::default();
        };
        name.parse().unwrap_or_else(|_| {
            warn!(
                rules = %name,
                normalized = %normalize(name),
                fallback = %Rules::default(),
                "unknown rule set in game record"
            );
            Rules::default()
        })
    }

    /// Empty board with the rule set applied and setup stones placed.
    pub fn initial_board(&self) -> Result<BoardState> {
        let mut board = BoardState::new(self.size)?.with_rules(self.rule_set());
        for &c in &self.black_setup {
            board = board.play_native(c, Color::Black)?;
        }
        for &c in &self.white_setup {
            board = board.play_native(c, Color::White)?;
        }
        Ok(board)
    }

    pub fn first_to_move(&self) -> Color {
        if self.handicap > 0 {
            Color::White
        } else {
            Color::Black
        }
    }
}

fn move_key(color: Color) -> &'static str {
    match color {
        Color::Black => "B",
        Color::White => "W",
    }
}

/// Replay the main line of one game tree.
pub fn replay_tree(tree: &GameTree) -> Result<Replay> {
    let line = tree.main_line();
    let Some((root, rest)) = line.split_first() else {
        return Err(Error::SgfSyntax {
            offset: 0,
            reason: "game tree without nodes".into(),
        });
    };
    let info = GameInfo::from_root(root)?;
    let mut log = TransitionLog::new(info.initial_board()?);
    let mut color = info.first_to_move();

    for (i, node) in rest.iter().enumerate() {
        if node.is_empty() {
            continue;
        }
        let value = match node.first(move_key(color)) {
            Some(v) => v,
            None => {
                color = color.opponent();
                node.first(move_key(color))
                    .ok_or_else(|| Error::UnrecognizedNode {
                        index: i + 1,
                        node: node.to_string(),
                    })?
            }
        };
        let coord = sgf_point(value, info.size)?;
        log.play(to_action(coord, info.size)?, color)?;
        color = color.opponent();
    }

    debug!(size = info.size, moves = log.len(), "replayed game record");
    Ok(Replay { info, log })
}

/// Replay the first game in `text`.
pub fn replay_str(text: &str) -> Result<Replay> {
    replay_tree(&sgf::parse(text)?)
}

/// Replay every game in `text`; the first failure aborts.
pub fn replay_collection(text: &str) -> Result<Vec<Replay>> {
    sgf::parse_collection(text)?.iter().map(replay_tree).collect()
}
