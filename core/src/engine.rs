use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Playing,
    GameOver,
}

impl EngineState {
    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Playing
    }
}

/// Board, score and undo history of one game, with the random source used to spawn tiles.
#[derive(Clone, Debug)]
pub struct GridEngine<R> {
    grid: Grid,
    score: Score,
    state: EngineState,
    history: History,
    rng: R,
}

impl<R: Rng> GridEngine<R> {
    /// Starts a game on an empty `size`×`size` board seeded with two tiles.
    pub fn new(size: Coord, rng: R) -> Self {
        let mut engine = Self {
            grid: Grid::new(size),
            score: 0,
            state: EngineState::Playing,
            history: History::new(),
            rng,
        };
        engine.new_game();
        engine
    }

    /// Resumes from an arbitrary board, already over when no move is left.
    pub fn from_grid(grid: Grid, score: Score, rng: R) -> Self {
        let state = if grid.can_move() {
            EngineState::Playing
        } else {
            EngineState::GameOver
        };
        Self {
            grid,
            score,
            state,
            history: History::new(),
            rng,
        }
    }

    pub fn from_saved(saved: SavedGame, rng: R) -> Result<Self> {
        let SavedGame {
            grid,
            score,
            over,
            mut history,
        } = saved;
        grid.validate()?;
        history.truncate_to_limit();
        history.validate(grid.size())?;

        let state = if over || !grid.can_move() {
            EngineState::GameOver
        } else {
            EngineState::Playing
        };
        Ok(Self {
            grid,
            score,
            state,
            history,
            rng,
        })
    }

    pub fn to_saved(&self) -> SavedGame {
        SavedGame {
            grid: self.grid.clone(),
            score: self.score,
            over: self.state.is_over(),
            history: self.history.clone(),
        }
    }

    pub fn new_game(&mut self) {
        self.grid = Grid::new(self.grid.size());
        self.score = 0;
        self.state = EngineState::Playing;
        self.history.clear();
        self.spawn_tile();
        self.spawn_tile();
        log::debug!("new {0}x{0} game", self.grid.size());
    }

    pub fn spawn_tile(&mut self) -> Option<Spawn> {
        spawn_random(&mut self.grid, &mut self.rng)
    }

    /// Slides and merges tiles without spawning; see [`GridEngine::settle`] for the rest of the move.
    ///
    /// A slide that changes nothing leaves board, score and history exactly as they were.
    pub fn slide(&mut self, direction: Direction) -> Result<Slide> {
        if self.state.is_over() {
            return Err(GameError::AlreadyEnded);
        }

        let snapshot = Snapshot {
            grid: self.grid.clone(),
            score: self.score,
        };

        let slide = self.grid.slide(direction);
        if slide.changed {
            self.history.push(snapshot);
            self.score = self.score.saturating_add(slide.score_gained);
            log::trace!(
                "slide {:?}: +{} ({} merges)",
                direction,
                slide.score_gained,
                slide.merged.len()
            );
        }

        Ok(slide)
    }

    /// Spawns the post-move tile and checks whether any move is left.
    pub fn settle(&mut self) -> (Option<Spawn>, EngineState) {
        let spawned = self.spawn_tile();
        if !self.grid.can_move() {
            log::debug!("game over with score {}", self.score);
            self.state = EngineState::GameOver;
        }
        (spawned, self.state)
    }

    /// Complete move, slide then settle.
    pub fn shift(&mut self, direction: Direction) -> Result<MoveOutcome> {
        let slide = self.slide(direction)?;
        let (spawned, state) = if slide.changed {
            self.settle()
        } else {
            (None, self.state)
        };

        Ok(MoveOutcome {
            changed: slide.changed,
            score_gained: slide.score_gained,
            state,
            spawned,
        })
    }

    pub fn undo(&mut self) -> UndoOutcome {
        if self.state.is_over() {
            return UndoOutcome::NoChange;
        }

        match self.history.pop() {
            Some(Snapshot { grid, score }) => {
                self.grid = grid;
                self.score = score;
                self.state = EngineState::Playing;
                UndoOutcome::Restored
            }
            None => UndoOutcome::NoChange,
        }
    }
}

impl<R> GridEngine<R> {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn can_move(&self) -> bool {
        self.grid.can_move()
    }

    pub fn size(&self) -> Coord {
        self.grid.size()
    }

    pub fn max_tile(&self) -> Tile {
        self.grid.max_tile()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.state.is_over() && !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn engine(rows: &[&[Tile]]) -> GridEngine<SmallRng> {
        GridEngine::from_grid(
            Grid::from_rows(rows).unwrap(),
            0,
            SmallRng::seed_from_u64(1),
        )
    }

    #[test]
    fn new_game_places_two_tiles() {
        let engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(3));

        assert_eq!(engine.grid().count_empty(), 14);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.state(), EngineState::Playing);
        assert_eq!(engine.history_len(), 0);
    }

    #[test]
    fn no_op_slide_leaves_history_untouched() {
        let mut engine = engine(&[&[2, 4, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);

        let outcome = engine.shift(Direction::Left).unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.spawned, None);
        assert_eq!(engine.history_len(), 0);
        assert_eq!(engine.grid().count_empty(), 14);
    }

    #[test]
    fn slide_adds_score_before_settle() {
        let mut engine = engine(&[&[4, 4, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);

        let slide = engine.slide(Direction::Left).unwrap();

        assert_eq!(slide.score_gained, 8);
        assert_eq!(engine.score(), 8);
        assert_eq!(engine.grid().count_empty(), 15);

        let (spawned, state) = engine.settle();
        assert!(spawned.is_some());
        assert_eq!(state, EngineState::Playing);
        assert_eq!(engine.grid().count_empty(), 14);
    }

    #[test]
    fn move_that_fills_the_last_hole_ends_the_game() {
        // sliding right leaves a single hole at (0, 0) with no matching neighbour for a 2 or a 4
        let mut engine = engine(&[&[8, 2, 4, 0], &[16, 2, 4, 8], &[2, 4, 8, 16], &[4, 8, 16, 32]]);

        let outcome = engine.shift(Direction::Right).unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.score_gained, 0);
        assert_eq!(outcome.spawned.map(|s| s.coords), Some((0, 0)));
        assert_eq!(outcome.state, EngineState::GameOver);
        assert!(engine.grid().is_full());
        assert!(!engine.can_undo());
    }

    #[test]
    fn moves_after_game_over_are_rejected() {
        let mut engine = engine(&[&[2, 4], &[4, 2]]);

        assert!(engine.is_over());
        assert_eq!(engine.shift(Direction::Left), Err(GameError::AlreadyEnded));
        assert_eq!(engine.undo(), UndoOutcome::NoChange);
    }

    #[test]
    fn undo_restores_board_and_score() {
        let mut engine = engine(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let before = engine.grid().clone();

        engine.shift(Direction::Left).unwrap();
        assert_eq!(engine.score(), 4);

        assert_eq!(engine.undo(), UndoOutcome::Restored);
        assert_eq!(engine.grid(), &before);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.undo(), UndoOutcome::NoChange);
    }

    #[test]
    fn saved_game_round_trips_through_json() {
        let mut engine = engine(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        engine.shift(Direction::Left).unwrap();

        let json = serde_json::to_string(&engine.to_saved()).unwrap();
        let saved: SavedGame = serde_json::from_str(&json).unwrap();
        let mut restored = GridEngine::from_saved(saved, SmallRng::seed_from_u64(9)).unwrap();

        assert_eq!(restored.grid(), engine.grid());
        assert_eq!(restored.score(), 4);
        assert_eq!(restored.undo(), UndoOutcome::Restored);
        assert_eq!(restored.score(), 0);
    }

    #[test]
    fn no_op_move_keeps_a_full_history_intact() {
        let mut saved = engine(&[&[2, 4, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]).to_saved();
        for score in 0..HISTORY_LIMIT as Score {
            saved.history.push(Snapshot {
                grid: Grid::new(4),
                score,
            });
        }
        let mut engine = GridEngine::from_saved(saved.clone(), SmallRng::seed_from_u64(9)).unwrap();

        let outcome = engine.shift(Direction::Left).unwrap();

        assert!(!outcome.changed);
        assert_eq!(engine.to_saved(), saved);
        let undos = core::iter::from_fn(|| engine.undo().has_update().then_some(())).count();
        assert_eq!(undos, HISTORY_LIMIT);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn overlong_saved_history_keeps_the_newest_moves() {
        let mut saved = engine(&[&[2, 0], &[0, 0]]).to_saved();
        for score in 0..HISTORY_LIMIT as Score {
            saved.history.push(Snapshot {
                grid: Grid::new(2),
                score,
            });
        }
        // histories written elsewhere can exceed the limit
        let mut json = serde_json::to_value(&saved).unwrap();
        let snapshots = json["history"]["snapshots"].as_array_mut().unwrap();
        let mut stale = snapshots[0].clone();
        stale["score"] = 100.into();
        snapshots.insert(0, stale);
        let saved: SavedGame = serde_json::from_value(json).unwrap();

        let mut engine = GridEngine::from_saved(saved, SmallRng::seed_from_u64(9)).unwrap();

        assert_eq!(engine.history_len(), HISTORY_LIMIT);
        let undos = core::iter::from_fn(|| engine.undo().has_update().then_some(())).count();
        assert_eq!(undos, HISTORY_LIMIT);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn saved_game_with_foreign_history_is_rejected() {
        let mut saved = engine(&[&[2, 0], &[0, 0]]).to_saved();
        saved.history.push(Snapshot {
            grid: Grid::new(3),
            score: 0,
        });

        assert!(matches!(
            GridEngine::from_saved(saved, SmallRng::seed_from_u64(9)),
            Err(GameError::InvalidBoardShape)
        ));
    }
}
