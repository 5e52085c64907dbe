//! Compact binary format for batches of trajectories.
//!
//! Each trajectory is one record:
//!
//! ```text
//! [board size: u8][length: u8] then length x [actor: u8][action id: u8]
//! ```
//!
//! Actors are `1` for black and `2` for white. There is no header, footer or
//! checksum. Board states are never stored; decoding replays every action on
//! a fresh empty board, so a decoded log is always rule-consistent and an
//! illegal recorded move is reported as corruption of the data.
//!
//! Action ids must fit in one byte, and pass is `N * N`, so only boards up to
//! 15x15 can be encoded. Logs that start from setup stones (handicap games)
//! are refused, since the format has nowhere to put them.

use std::io::{Read, Write};

use crate::constants::MAX_BOARD_SIZE;
use crate::coord::{pass_action, resign_action};
use crate::engine::position::Color;
use crate::error::{Error, Result};
use crate::trajectory::TransitionLog;

const BLACK: u8 = 1;
const WHITE: u8 = 2;

fn actor_byte(color: Color) -> u8 {
    match color {
        Color::Black => BLACK,
        Color::White => WHITE,
    }
}

fn byte(what: &'static str, value: usize) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::ValueOutOfRange { what, value })
}

/// Serialize a batch of trajectories.
///
/// Nothing is returned unless every trajectory fits the format.
pub fn encode(logs: &[TransitionLog]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(logs.iter().map(|l| 2 + 2 * l.len()).sum());
    for log in logs {
        let size = log.board_size();
        // Pass must be representable even if this log never passes
        if pass_action(size) > u8::MAX as usize {
            return Err(Error::ValueOutOfRange {
                what: "board size",
                value: size,
            });
        }
        let initial = log.initial();
        let stones = initial.stones(Color::Black).len() + initial.stones(Color::White).len();
        if stones > 0 {
            return Err(Error::SetupStones { stones });
        }
        out.push(byte("board size", size)?);
        out.push(byte("trajectory length", log.len())?);
        for (actor, action) in log.moves() {
            out.push(actor_byte(actor));
            out.push(byte("action id", action)?);
        }
    }
    Ok(out)
}

/// Rebuild trajectories by replaying every recorded move.
///
/// The first failure aborts the whole batch; records decoded before it are
/// dropped.
pub fn decode(bytes: &[u8]) -> Result<Vec<TransitionLog>> {
    let mut logs = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let record = offset;
        let [size, len] = match bytes.get(offset..offset + 2) {
            Some(&[s, l]) => [s as usize, l as usize],
            _ => return Err(Error::corrupt(offset, "truncated record header")),
        };
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(Error::corrupt(offset, format!("invalid board size {size}")));
        }
        offset += 2;

        let body = bytes.get(offset..offset + 2 * len).ok_or_else(|| {
            Error::corrupt(
                record,
                format!(
                    "record declares {len} moves ({} bytes) but only {} bytes follow",
                    2 * len,
                    bytes.len() - offset
                ),
            )
        })?;

        let mut log = TransitionLog::empty(size)?;
        for (i, pair) in body.chunks_exact(2).enumerate() {
            let at = offset + 2 * i;
            let actor = match pair[0] {
                BLACK => Color::Black,
                WHITE => Color::White,
                b => return Err(Error::corrupt(at, format!("unknown actor {b}"))),
            };
            let action = pair[1] as usize;
            if action == resign_action(size) {
                return Err(Error::corrupt(at + 1, "resignation is never recorded"));
            }
            if action > pass_action(size) {
                return Err(Error::corrupt(
                    at + 1,
                    format!("action {action} out of range for a {size}x{size} board"),
                ));
            }
            log.play(action, actor)?;
        }
        offset += 2 * len;
        logs.push(log);
    }
    Ok(logs)
}

/// Encode `logs` and write them to `w`.
pub fn write_to<W: Write>(mut w: W, logs: &[TransitionLog]) -> Result<()> {
    let bytes = encode(logs)?;
    w.write_all(&bytes)
        .and_then(|()| w.flush())
        .map_err(|source| Error::Io {
            operation: "write trajectories".into(),
            source,
        })
}

/// Read all of `r` and decode it.
pub fn read_from<R: Read>(mut r: R) -> Result<Vec<TransitionLog>> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes).map_err(|source| Error::Io {
        operation: "read trajectories".into(),
        source,
    })?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BoardState;
    use proptest::prelude::*;

    fn sample_log() -> TransitionLog {
        let mut log = TransitionLog::empty(9).unwrap();
        log.play(40, Color::Black).unwrap();
        log.play(81, Color::White).unwrap();
        log
    }

    #[test]
    fn test_scenario_round_trip() {
        let log = sample_log();
        let state = log.current();
        assert!(!state.is_terminal());
        let planes = state.encode();
        assert_eq!(planes.get(0, 4, 4), Some(1));
        assert_eq!(planes.get(2, 4, 4), Some(0));

        let bytes = encode(std::slice::from_ref(&log)).unwrap();
        assert_eq!(bytes, vec![9, 2, 1, 40, 2, 81]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, vec![log]);
    }

    #[test]
    fn test_short_record_is_corrupt() {
        let mut bytes = vec![9, 5];
        bytes.extend([1, 0, 2, 1, 1, 2, 2, 3]);
        match decode(&bytes) {
            Err(Error::CorruptStream { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected CorruptStream, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_header_byte_is_corrupt() {
        let mut bytes = encode(&[sample_log()]).unwrap();
        bytes.push(9);
        assert!(matches!(
            decode(&bytes),
            Err(Error::CorruptStream { offset: 6, .. })
        ));
    }

    #[test]
    fn test_large_boards_do_not_encode() {
        for size in [16, 19] {
            let log = TransitionLog::empty(size).unwrap();
            assert!(matches!(
                encode(&[log]),
                Err(Error::ValueOutOfRange { what: "board size", .. })
            ));
        }
        assert!(encode(&[TransitionLog::empty(15).unwrap()]).is_ok());
    }

    #[test]
    fn test_setup_stones_do_not_encode() {
        let handicap = crate::replay::replay_str("(;SZ[9]HA[2]AB[cg][gc];W[ee];B[cc];W[gg])").unwrap();
        let plain = TransitionLog::empty(9).unwrap();
        assert!(matches!(
            encode(&[plain, handicap.log]),
            Err(Error::SetupStones { stones: 2 })
        ));
    }

    #[test]
    fn test_bad_bytes_are_rejected() {
        assert!(matches!(decode(&[0, 0]), Err(Error::CorruptStream { .. })));
        assert!(matches!(decode(&[9, 1, 3, 0]), Err(Error::CorruptStream { .. })));
        assert!(matches!(decode(&[9, 1, 1, 82]), Err(Error::CorruptStream { .. })));
        assert!(matches!(decode(&[9, 1, 1, 90]), Err(Error::CorruptStream { .. })));
    }

    #[test]
    fn test_illegal_replay_aborts_batch() {
        let good = encode(&[sample_log()]).unwrap();
        let mut bytes = good.clone();
        bytes.extend([9, 2, 1, 40, 2, 40]);
        assert!(matches!(decode(&bytes), Err(Error::IllegalMove(_))));
        assert_eq!(decode(&good).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(decode(&[]).unwrap().is_empty());
        assert!(encode(&[]).unwrap().is_empty());
        let empty = TransitionLog::empty(7).unwrap();
        assert_eq!(decode(&encode(&[empty.clone()]).unwrap()).unwrap(), vec![empty]);
    }

    #[test]
    fn test_io_helpers() {
        let logs = vec![sample_log(), TransitionLog::empty(5).unwrap()];
        let mut buf = Vec::new();
        write_to(&mut buf, &logs).unwrap();
        assert_eq!(read_from(buf.as_slice()).unwrap(), logs);
    }

    /// Build a legal game by picking from the legal actions with `choices`.
    fn game(size: usize, choices: &[usize]) -> TransitionLog {
        let mut log = TransitionLog::new(BoardState::new(size).unwrap());
        let mut color = Color::Black;
        for &c in choices {
            if log.current().is_terminal() {
                break;
            }
            let legal = log.current().legal_actions(color, true);
            log.play(legal[c % legal.len()], color).unwrap();
            color = color.opponent();
        }
        log
    }

    proptest! {
        #[test]
        fn prop_legal_games_round_trip(
            size in 2usize..=15,
            choices in prop::collection::vec(any::<usize>(), 0..60),
        ) {
            let log = game(size, &choices);
            let decoded = decode(&encode(std::slice::from_ref(&log)).unwrap()).unwrap();
            prop_assert_eq!(decoded.len(), 1);
            prop_assert_eq!(
                decoded[0].moves().collect::<Vec<_>>(),
                log.moves().collect::<Vec<_>>()
            );
            prop_assert_eq!(&decoded[0], &log);
        }
    }
}
