use alloc::collections::VecDeque;
use serde::{Deserialize, Serialize};

use crate::*;

/// How many moves can be undone.
pub const HISTORY_LIMIT: usize = 10;

/// Board and score before a move. The terminal flag is not kept since undo is refused once the game is over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: Score,
}

/// Bounded undo stack, dropping the oldest snapshot once full.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.snapshots.len() == HISTORY_LIMIT {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Drops the oldest snapshots past [`HISTORY_LIMIT`]; a stored history may hold more.
    pub(crate) fn truncate_to_limit(&mut self) {
        let excess = self.snapshots.len().saturating_sub(HISTORY_LIMIT);
        if excess > 0 {
            log::debug!("dropping {} stale snapshots", excess);
            self.snapshots.drain(..excess);
        }
    }

    /// Checks every snapshot is a valid board of the given size.
    pub(crate) fn validate(&self, size: Coord) -> Result<()> {
        self.snapshots.iter().try_for_each(|snapshot| {
            snapshot.grid.validate()?;
            if snapshot.grid.size() == size {
                Ok(())
            } else {
                Err(GameError::InvalidBoardShape)
            }
        })
    }
}
