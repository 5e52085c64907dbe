//! Coordinate transcoding.
//!
//! Three representations name the same point:
//!
//! - *native*: the engine's packed index `x + y * (N + 2)` on the padded board,
//!   with `x, y` in `1..=N` and `y` counted from the bottom edge.
//! - *rowcol*: `(row, col)` in `[0, N)^2`, row 0 being the top line as the
//!   board is conventionally printed.
//! - *action id*: `row * N + col`, with `N^2` for pass and `N^2 + 1` for resign.
//!
//! GTP vertex text (`"D4"`, `"pass"`) is supported as a fourth, human-facing
//! form. Everything here is pure.

use crate::constants::{PASS, RESIGN};
use crate::error::{Error, Result};

/// A native engine coordinate. `PASS` and `RESIGN` are negative sentinels.
pub type Coord = i32;

/// A flat action id in `[0, N^2 + 1]`.
pub type ActionId = usize;

/// Column labels used by GTP. `I` is skipped to avoid confusion with `J`.
const COLUMN_LABELS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Width of one row of the padded native board.
#[inline]
pub fn stride(size: usize) -> usize {
    size + 2
}

/// GTP letter of a column, counted from the left edge.
#[inline]
pub fn column_label(col: usize) -> char {
    COLUMN_LABELS.get(col).map_or('?', |&c| c as char)
}

/// Action id of a pass on a board of the given size.
#[inline]
pub fn pass_action(size: usize) -> ActionId {
    size * size
}

/// Action id of a resignation on a board of the given size.
#[inline]
pub fn resign_action(size: usize) -> ActionId {
    size * size + 1
}

/// Convert a native coordinate to `(row, col)`.
pub fn to_rowcol(coord: Coord, size: usize) -> Result<(usize, usize)> {
    if coord < 0 {
        return Err(Error::out_of_range(coord, size));
    }
    let w = stride(size);
    let c = coord as usize;
    let (x, y) = (c % w, c / w);
    if x < 1 || x > size || y < 1 || y > size {
        return Err(Error::out_of_range(coord, size));
    }
    Ok((size - y, x - 1))
}

/// Convert `(row, col)` to a native coordinate.
pub fn from_rowcol(row: usize, col: usize, size: usize) -> Result<Coord> {
    if row >= size || col >= size {
        return Err(Error::out_of_range(format!("({row}, {col})"), size));
    }
    let (x, y) = (col + 1, size - row);
    Ok((x + y * stride(size)) as Coord)
}

/// Convert a native coordinate (including pass and resign) to an action id.
pub fn to_action(coord: Coord, size: usize) -> Result<ActionId> {
    match coord {
        PASS => Ok(pass_action(size)),
        RESIGN => Ok(resign_action(size)),
        _ => {
            let (row, col) = to_rowcol(coord, size)?;
            Ok(row * size + col)
        }
    }
}

/// Convert an action id (including pass and resign) to a native coordinate.
pub fn from_action(action: ActionId, size: usize) -> Result<Coord> {
    if action == pass_action(size) {
        Ok(PASS)
    } else if action == resign_action(size) {
        Ok(RESIGN)
    } else if action < size * size {
        from_rowcol(action / size, action % size, size)
    } else {
        Err(Error::out_of_range(format!("action {action}"), size))
    }
}

/// Parse a GTP vertex (e.g. `"D4"`, `"pass"`, `"resign"`) into a native coordinate.
///
/// Rows are numbered from the bottom edge, columns lettered from the left
/// with `I` skipped.
pub fn parse_vertex(s: &str, size: usize) -> Result<Coord> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("pass") {
        return Ok(PASS);
    }
    if s.eq_ignore_ascii_case("resign") {
        return Ok(RESIGN);
    }

    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return Err(Error::out_of_range(s, size));
    }
    let col_char = bytes[0].to_ascii_uppercase();
    let col = COLUMN_LABELS
        .iter()
        .position(|&c| c == col_char)
        .ok_or_else(|| Error::out_of_range(s, size))?;
    let number: usize = s[1..].parse().map_err(|_| Error::out_of_range(s, size))?;
    if number < 1 || number > size {
        return Err(Error::out_of_range(s, size));
    }
    from_rowcol(size - number, col, size).map_err(|_| Error::out_of_range(s, size))
}

/// Render a native coordinate as a GTP vertex.
///
/// Coordinates that are not on the board render as `#<coord>`.
pub fn vertex_str(coord: Coord, size: usize) -> String {
    match coord {
        PASS => "pass".into(),
        RESIGN => "resign".into(),
        _ => match to_rowcol(coord, size) {
            Ok((row, col)) => format!("{}{}", COLUMN_LABELS[col] as char, size - row),
            Err(_) => format!("#{coord}"),
        },
    }
}
