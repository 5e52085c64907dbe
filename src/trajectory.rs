//! Ordered records of board transitions.

use crate::coord::{ActionId, resign_action};
use crate::engine::position::Color;
use crate::error::{Error, Result};
use crate::state::BoardState;

/// One applied move: `after` is `before` with `action` played by `actor`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub actor: Color,
    pub before: BoardState,
    pub action: ActionId,
    pub after: BoardState,
}

/// The transitions of one game, in order.
///
/// Entries can only be added by playing on the current state, so the state
/// after entry `i` is always the state before entry `i + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionLog {
    initial: BoardState,
    transitions: Vec<Transition>,
}

impl TransitionLog {
    /// Start an empty log at `initial`.
    pub fn new(initial: BoardState) -> Self {
        Self {
            initial,
            transitions: Vec::new(),
        }
    }

    /// Start an empty log on an empty board of `size`.
    pub fn empty(size: usize) -> Result<Self> {
        Ok(Self::new(BoardState::new(size)?))
    }

    pub fn board_size(&self) -> usize {
        self.initial.size()
    }

    /// State the first transition starts from.
    pub fn initial(&self) -> &BoardState {
        &self.initial
    }

    /// State after the last transition.
    pub fn current(&self) -> &BoardState {
        self.transitions.last().map_or(&self.initial, |t| &t.after)
    }

    /// Play `action` for `actor` on the current state and record it.
    ///
    /// A resignation ends a game without being a move, so it is refused here.
    pub fn play(&mut self, action: ActionId, actor: Color) -> Result<&BoardState> {
        if action == resign_action(self.board_size()) {
            return Err(Error::IllegalMove(format!(
                "Resignation by {actor} cannot be recorded as a transition"
            )));
        }
        let before = self.current().clone();
        let after = before.play(action, actor)?;
        self.transitions.push(Transition {
            actor,
            before,
            action,
            after,
        });
        Ok(self.current())
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// `(actor, action)` pairs in order.
    pub fn moves(&self) -> impl Iterator<Item = (Color, ActionId)> + '_ {
        self.transitions.iter().map(|t| (t.actor, t.action))
    }
}

impl<'a> IntoIterator for &'a TransitionLog {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}
