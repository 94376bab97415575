#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use grid::*;
pub use history::*;
pub use session::*;
pub use spawn::*;
pub use types::*;

mod engine;
mod error;
mod grid;
mod history;
mod session;
mod spawn;
mod types;

/// Side length of the board the game ships with.
pub const DEFAULT_SIZE: Coord = 4;

/// Result of the sliding phase of a move, before the new tile is spawned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slide {
    pub changed: bool,
    pub score_gained: Score,
    /// Cells holding a freshly merged tile.
    pub merged: Vec<Coord2>,
}

impl Slide {
    pub const fn has_update(&self) -> bool {
        self.changed
    }

    pub fn has_merges(&self) -> bool {
        !self.merged.is_empty()
    }
}

/// Result of a complete move: slide, spawn and terminal check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub changed: bool,
    pub score_gained: Score,
    pub state: EngineState,
    pub spawned: Option<Spawn>,
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        self.changed
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    NoChange,
    Restored,
}

impl UndoOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Restored => true,
        }
    }
}

/// A game as stored between page loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub grid: Grid,
    pub score: Score,
    pub over: bool,
    pub history: History,
}
