use alloc::vec::Vec;
use core::time::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Delay before the post-move tile spawns, letting the slide animation finish.
pub const SPAWN_DELAY: Duration = Duration::from_millis(150);

/// How long freshly merged tiles stay highlighted.
pub const MERGE_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Delay between the final move and the game-over prompt.
pub const GAME_OVER_PROMPT_DELAY: Duration = Duration::from_millis(500);

/// Work deferred past the synchronous part of a move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedEvent {
    Spawn,
    MergeSettled,
    GameOverPrompt,
}

impl TimedEvent {
    pub const fn delay(self) -> Duration {
        use TimedEvent::*;
        match self {
            Spawn => SPAWN_DELAY,
            MergeSettled => MERGE_SETTLE_DELAY,
            GameOverPrompt => GAME_OVER_PROMPT_DELAY,
        }
    }
}

/// Delivers a [`TimedEvent`] back to [`GameSession::fire`] once `delay` has passed.
///
/// Events with equal delays must be delivered in the order they were scheduled. Nothing is ever cancelled.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, event: TimedEvent);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Scheduled {
    due: Duration,
    seq: u64,
    event: TimedEvent,
}

/// Scheduler running on a virtual clock that only moves when asked to.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    seq: u64,
    queue: Vec<Scheduled>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Moves the clock to the earliest due event and hands it out.
    pub fn next_event(&mut self) -> Option<TimedEvent> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(_, scheduled)| (scheduled.due, scheduled.seq))
            .map(|(index, _)| index)?;
        let scheduled = self.queue.remove(index);
        self.now = self.now.max(scheduled.due);
        Some(scheduled.event)
    }

    /// Moves the clock forward by `elapsed`, returning the events that came due in firing order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimedEvent> {
        let until = self.now + elapsed;
        let mut due = Vec::new();
        while let Some(next) = self.queue.iter().map(|scheduled| scheduled.due).min() {
            if next > until {
                break;
            }
            if let Some(event) = self.next_event() {
                due.push(event);
            }
        }
        self.now = until;
        due
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, event: TimedEvent) {
        self.queue.push(Scheduled {
            due: self.now + delay,
            seq: self.seq,
            event,
        });
        self.seq += 1;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Pending {
    spawn: bool,
    merge_settle: bool,
    game_over_prompt: bool,
}

impl Pending {
    const fn is_busy(self) -> bool {
        self.spawn || self.merge_settle
    }
}

/// What a fired [`TimedEvent`] did to the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Nothing was waiting on the event.
    Ignored,
    Settled {
        spawned: Option<Spawn>,
        state: EngineState,
    },
    MergeSettled,
    GameOverPrompt {
        score: Score,
    },
}

impl SessionUpdate {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// A [`GridEngine`] driven through deferred moves, plus the best score across games.
///
/// While a move's deferred work is outstanding the session is busy and refuses moves, undo and new games alike.
#[derive(Clone, Debug)]
pub struct GameSession<R> {
    engine: GridEngine<R>,
    best_score: Score,
    best_dirty: bool,
    pending: Pending,
}

impl<R: Rng> GameSession<R> {
    pub fn new(engine: GridEngine<R>, best_score: Score) -> Self {
        let mut session = Self {
            engine,
            best_score,
            best_dirty: false,
            pending: Pending::default(),
        };
        session.record_best();
        session
    }

    /// Runs the synchronous half of a move and schedules the rest.
    pub fn begin_move<S: Scheduler + ?Sized>(
        &mut self,
        direction: Direction,
        scheduler: &mut S,
    ) -> Result<Slide> {
        self.check_idle()?;

        let slide = self.engine.slide(direction)?;
        if slide.changed {
            self.record_best();
            self.pending.spawn = true;
            scheduler.schedule(SPAWN_DELAY, TimedEvent::Spawn);
            if slide.has_merges() {
                self.pending.merge_settle = true;
                scheduler.schedule(MERGE_SETTLE_DELAY, TimedEvent::MergeSettled);
            }
        }

        Ok(slide)
    }

    pub fn fire<S: Scheduler + ?Sized>(
        &mut self,
        event: TimedEvent,
        scheduler: &mut S,
    ) -> SessionUpdate {
        use TimedEvent::*;

        match event {
            Spawn if self.pending.spawn => {
                self.pending.spawn = false;
                let (spawned, state) = self.engine.settle();
                if state.is_over() {
                    self.pending.game_over_prompt = true;
                    scheduler.schedule(GAME_OVER_PROMPT_DELAY, GameOverPrompt);
                }
                SessionUpdate::Settled { spawned, state }
            }
            MergeSettled if self.pending.merge_settle => {
                self.pending.merge_settle = false;
                SessionUpdate::MergeSettled
            }
            GameOverPrompt if self.pending.game_over_prompt => {
                self.pending.game_over_prompt = false;
                SessionUpdate::GameOverPrompt {
                    score: self.engine.score(),
                }
            }
            _ => {
                log::warn!("nothing pending for {:?}, ignored", event);
                SessionUpdate::Ignored
            }
        }
    }

    pub fn undo(&mut self) -> Result<UndoOutcome> {
        self.check_idle()?;
        Ok(self.engine.undo())
    }

    pub fn new_game(&mut self) -> Result<()> {
        self.check_idle()?;
        self.pending = Pending::default();
        self.engine.new_game();
        Ok(())
    }

    fn record_best(&mut self) {
        if self.engine.score() > self.best_score {
            self.best_score = self.engine.score();
            self.best_dirty = true;
        }
    }
}

impl<R> GameSession<R> {
    pub fn engine(&self) -> &GridEngine<R> {
        &self.engine
    }

    pub fn best_score(&self) -> Score {
        self.best_score
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_busy()
    }

    /// Returns the best score once after every time it was raised, so the caller can persist it.
    pub fn take_best_update(&mut self) -> Option<Score> {
        core::mem::take(&mut self.best_dirty).then_some(self.best_score)
    }

    fn check_idle(&self) -> Result<()> {
        if self.pending.is_busy() {
            log::debug!("refused while a move is in progress");
            Err(GameError::MoveInProgress)
        } else {
            Ok(())
        }
    }
}
