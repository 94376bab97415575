use crate::input::{direction_for_key, swipe_direction};
use crate::leaderboard::{LeaderboardState, LeaderboardView, fetch_leaderboard, submit_score};
use crate::utils::*;
use clap::Args;
use core::time::Duration;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use twofold_core as game;
use twofold_protocol::{ApiFailure, LeaderboardEntry, ScoreSubmission};
use wasm_bindgen::JsCast;
use web_sys::{HtmlInputElement, KeyboardEvent};
use yew::html::Scope;
use yew::prelude::*;

impl StorageKey for game::SavedGame {
    const KEY: &'static str = "twofold:game:v1";
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
struct BestScore(game::Score);

impl StorageKey for BestScore {
    const KEY: &'static str = "twofold:best";
}

/// Class list for a tile value; values past 2048 share one style.
pub(crate) fn tile_class(tile: game::Tile) -> Classes {
    match tile {
        0 => classes!("tile", "empty"),
        1..=2048 => classes!("tile", format!("tile-{}", tile)),
        _ => classes!("tile", "tile-super"),
    }
}

/// Delivers deferred session work back to the component as messages.
struct TimeoutScheduler {
    link: Scope<GameView>,
}

impl TimeoutScheduler {
    fn new(link: &Scope<GameView>) -> Self {
        Self { link: link.clone() }
    }
}

impl game::Scheduler for TimeoutScheduler {
    fn schedule(&mut self, delay: Duration, event: game::TimedEvent) {
        let link = self.link.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        log::trace!("{:?} in {}ms", event, millis);
        Timeout::new(millis, move || link.send_message(Msg::Timer(event))).forget();
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SubmitState {
    Idle,
    Sending,
    Sent,
    Failed(ApiFailure),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Move(game::Direction),
    Timer(game::TimedEvent),
    Undo,
    NewGame,
    TouchStart(f64, f64),
    TouchEnd(f64, f64),
    NameInput(String),
    SubmitScore,
    Submitted(Result<(), ApiFailure>),
    RefreshLeaderboard,
    LeaderboardLoaded(Result<Vec<LeaderboardEntry>, ApiFailure>),
}

#[derive(Args, Properties, Debug, Clone, PartialEq, Default)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Origin of the leaderboard API, empty for the page's own
    #[arg(long, default_value = "")]
    #[prop_or_default]
    pub api: String,
}

impl GameProps {
    fn forced_seed(&self) -> Option<u64> {
        let seed = self.seed.as_deref()?;
        match seed.parse() {
            Ok(seed) => Some(seed),
            Err(err) => {
                log::warn!("ignoring seed {:?}: {}", seed, err);
                None
            }
        }
    }
}

pub(crate) struct GameView {
    session: game::GameSession<SmallRng>,
    /// Cells that merged in the last move, highlighted until the merge settles.
    merged: Vec<game::Coord2>,
    spawned: Option<game::Coord2>,
    game_over: Option<game::Score>,
    player_name: String,
    submit: SubmitState,
    leaderboard: LeaderboardState,
    touch_start: Option<(f64, f64)>,
    _keydown: EventListener,
}

impl GameView {
    fn load_engine(props: &GameProps) -> game::GridEngine<SmallRng> {
        let forced = props.forced_seed();
        let seed = forced.unwrap_or_else(js_random_seed);
        log::debug!("seed: {}", seed);

        // A forced seed always starts over so the game is reproducible.
        let saved = if forced.is_some() {
            None
        } else {
            Option::<game::SavedGame>::local_or_default()
        };

        saved
            .and_then(|saved| {
                game::GridEngine::from_saved(saved, SmallRng::seed_from_u64(seed))
                    .inspect_err(|err| log::warn!("discarding saved game: {}", err))
                    .ok()
            })
            .unwrap_or_else(|| {
                game::GridEngine::new(game::DEFAULT_SIZE, SmallRng::seed_from_u64(seed))
            })
    }

    fn create_keydown_listener(ctx: &Context<Self>) -> EventListener {
        let link = ctx.link().clone();
        EventListener::new_with_options(
            &gloo::utils::document(),
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let typing = event
                    .target()
                    .is_some_and(|target| target.has_type::<HtmlInputElement>());
                if typing {
                    return;
                }
                if let Some(direction) = direction_for_key(&event.key()) {
                    event.prevent_default();
                    link.send_message(Msg::Move(direction));
                }
            },
        )
    }

    fn save_game(&self) {
        Some(self.session.engine().to_saved()).local_save();
    }

    fn save_best(&mut self) {
        if let Some(best) = self.session.take_best_update() {
            log::debug!("new best score: {}", best);
            Some(BestScore(best)).local_save();
        }
    }

    fn clear_highlights(&mut self) {
        self.merged.clear();
        self.spawned = None;
    }

    fn begin_move(&mut self, ctx: &Context<Self>, direction: game::Direction) -> bool {
        let mut scheduler = TimeoutScheduler::new(ctx.link());
        match self.session.begin_move(direction, &mut scheduler) {
            Ok(slide) if slide.changed => {
                log::debug!("{:?} +{}", direction, slide.score_gained);
                self.merged = slide.merged;
                self.spawned = None;
                self.save_best();
                true
            }
            Ok(_) => false,
            Err(err) => {
                log::debug!("{:?} refused: {}", direction, err);
                false
            }
        }
    }

    fn fire(&mut self, ctx: &Context<Self>, event: game::TimedEvent) -> bool {
        use game::SessionUpdate::*;

        let mut scheduler = TimeoutScheduler::new(ctx.link());
        match self.session.fire(event, &mut scheduler) {
            Ignored => false,
            Settled { spawned, state } => {
                self.spawned = spawned.map(|spawn| spawn.coords);
                if state.is_over() {
                    log::info!("game over at {}", self.session.engine().score());
                }
                self.save_game();
                true
            }
            MergeSettled => {
                self.merged.clear();
                true
            }
            GameOverPrompt { score } => {
                self.game_over = Some(score);
                self.submit = SubmitState::Idle;
                true
            }
        }
    }

    fn undo(&mut self) -> bool {
        match self.session.undo() {
            Ok(outcome) if outcome.has_update() => {
                self.clear_highlights();
                self.save_game();
                true
            }
            Ok(_) => false,
            Err(err) => {
                log::debug!("undo refused: {}", err);
                false
            }
        }
    }

    fn new_game(&mut self) -> bool {
        match self.session.new_game() {
            Ok(()) => {
                self.clear_highlights();
                self.game_over = None;
                self.submit = SubmitState::Idle;
                self.save_game();
                true
            }
            Err(err) => {
                log::debug!("new game refused: {}", err);
                false
            }
        }
    }

    fn refresh_leaderboard(&mut self, ctx: &Context<Self>) {
        self.leaderboard = LeaderboardState::Loading;
        let link = ctx.link().clone();
        let api = ctx.props().api.clone();
        wasm_bindgen_futures::spawn_local(async move {
            link.send_message(Msg::LeaderboardLoaded(fetch_leaderboard(&api).await));
        });
    }

    fn submit_score(&mut self, ctx: &Context<Self>) -> bool {
        let Some(score) = self.game_over else {
            return false;
        };
        if matches!(self.submit, SubmitState::Sending | SubmitState::Sent) {
            return false;
        }

        let submission = ScoreSubmission {
            player_name: self.player_name.clone(),
            score,
        };
        if let Err(err) = submission.clone().validate() {
            self.submit = SubmitState::Failed(ApiFailure::Rejected(err.to_string()));
            return true;
        }

        self.submit = SubmitState::Sending;
        let link = ctx.link().clone();
        let api = ctx.props().api.clone();
        wasm_bindgen_futures::spawn_local(async move {
            link.send_message(Msg::Submitted(submit_score(&api, &submission).await));
        });
        true
    }

    fn view_board(&self, ctx: &Context<Self>) -> Html {
        let grid = self.session.engine().grid();
        let size = grid.size();

        let ontouchstart = ctx.link().batch_callback(|e: TouchEvent| {
            e.touches()
                .get(0)
                .map(|touch| Msg::TouchStart(touch.client_x().into(), touch.client_y().into()))
        });
        let ontouchend = ctx.link().batch_callback(|e: TouchEvent| {
            e.changed_touches()
                .get(0)
                .map(|touch| Msg::TouchEnd(touch.client_x().into(), touch.client_y().into()))
        });

        html! {
            <div class="board" style={format!("--size: {size}")} {ontouchstart} {ontouchend}>
                {
                    for (0..size).flat_map(|row| (0..size).map(move |col| (row, col))).map(|coords| {
                        let tile = grid.tile_at(coords);
                        let mut class = tile_class(tile);
                        if self.merged.contains(&coords) {
                            class.push("merged");
                        }
                        if self.spawned == Some(coords) {
                            class.push("new");
                        }
                        html! {
                            <div class="cell">
                                <div {class}>
                                    if tile != 0 {
                                        {tile}
                                    }
                                </div>
                            </div>
                        }
                    })
                }
            </div>
        }
    }

    fn view_game_over(&self, ctx: &Context<Self>, score: game::Score) -> Html {
        let oninput = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::NameInput(input.value())
        });
        let onsubmit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::SubmitScore
        });
        let cb_try_again = ctx.link().callback(|_| Msg::NewGame);
        let sending = matches!(self.submit, SubmitState::Sending);

        let status = match &self.submit {
            SubmitState::Idle => html! {},
            SubmitState::Sending => html! { <p class="muted">{"Submitting…"}</p> },
            SubmitState::Sent => html! { <p>{"Score submitted!"}</p> },
            SubmitState::Failed(failure) => html! { <p class="error">{failure.to_string()}</p> },
        };

        html! {
            <Modal>
                <div class="overlay">
                    <article>
                        <h2>{"Game over!"}</h2>
                        <p>{"Final score: "}<strong>{score}</strong></p>
                        if !matches!(self.submit, SubmitState::Sent) {
                            <form {onsubmit}>
                                <input
                                    type="text"
                                    placeholder="Your name"
                                    maxlength={twofold_protocol::MAX_NAME_LEN.to_string()}
                                    value={self.player_name.clone()}
                                    {oninput}
                                    disabled={sending}
                                />
                                <button type="submit" disabled={sending}>{"Submit score"}</button>
                            </form>
                        }
                        {status}
                        <button onclick={cb_try_again}>{"Try again"}</button>
                    </article>
                </div>
            </Modal>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let engine = Self::load_engine(ctx.props());
        let best: Option<BestScore> = LocalOrDefault::local_or_default();
        let game_over = engine.is_over().then(|| engine.score());

        let mut view = Self {
            session: game::GameSession::new(engine, best.map_or(0, |best| best.0)),
            merged: Vec::new(),
            spawned: None,
            game_over,
            player_name: String::new(),
            submit: SubmitState::Idle,
            leaderboard: LeaderboardState::Loading,
            touch_start: None,
            _keydown: Self::create_keydown_listener(ctx),
        };
        view.save_best();
        view.save_game();
        view.refresh_leaderboard(ctx);
        view
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Move(direction) => self.begin_move(ctx, direction),
            Timer(event) => self.fire(ctx, event),
            Undo => self.undo(),
            NewGame => self.new_game(),
            TouchStart(x, y) => {
                self.touch_start = Some((x, y));
                false
            }
            TouchEnd(x, y) => match self.touch_start.take() {
                Some(start) => match swipe_direction(start, (x, y)) {
                    Some(direction) => self.begin_move(ctx, direction),
                    None => false,
                },
                None => false,
            },
            NameInput(name) => {
                self.player_name = name;
                false
            }
            SubmitScore => self.submit_score(ctx),
            Submitted(Ok(())) => {
                log::info!("score submitted");
                self.submit = SubmitState::Sent;
                self.refresh_leaderboard(ctx);
                true
            }
            Submitted(Err(failure)) => {
                self.submit = SubmitState::Failed(failure);
                true
            }
            RefreshLeaderboard => {
                self.refresh_leaderboard(ctx);
                true
            }
            LeaderboardLoaded(result) => {
                self.leaderboard = match result {
                    Ok(entries) => LeaderboardState::Loaded(entries),
                    Err(failure) => LeaderboardState::Failed(failure),
                };
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let engine = self.session.engine();
        let busy = self.session.is_busy();

        let cb_new_game = ctx.link().callback(|_| Msg::NewGame);
        let cb_undo = ctx.link().callback(|_| Msg::Undo);
        let cb_retry = ctx.link().callback(|_| Msg::RefreshLeaderboard);

        html! {
            <div class="twofold">
                <header>
                    <h1>{"2048"}</h1>
                    <div class="scores">
                        <div class="score"><small>{"Score"}</small><span>{engine.score()}</span></div>
                        <div class="score"><small>{"Best"}</small><span>{self.session.best_score()}</span></div>
                    </div>
                </header>
                <nav>
                    <button onclick={cb_new_game} disabled={busy}>{"New Game"}</button>
                    <button onclick={cb_undo} disabled={busy || !engine.can_undo()}>{"Undo"}</button>
                </nav>
                {self.view_board(ctx)}
                if let Some(score) = self.game_over {
                    {self.view_game_over(ctx, score)}
                }
                <LeaderboardView state={self.leaderboard.clone()} on_retry={cb_retry}/>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_get_value_classes() {
        assert_eq!(tile_class(0), classes!("tile", "empty"));
        assert_eq!(tile_class(2), classes!("tile", "tile-2"));
        assert_eq!(tile_class(2048), classes!("tile", "tile-2048"));
        assert_eq!(tile_class(4096), classes!("tile", "tile-super"));
    }

    #[test]
    fn storage_keys_are_namespaced() {
        assert_eq!(<game::SavedGame as StorageKey>::KEY, "twofold:game:v1");
        assert_eq!(<BestScore as StorageKey>::KEY, "twofold:best");
    }

    #[test]
    fn best_score_is_stored_as_a_bare_number() {
        assert_eq!(serde_json::to_string(&BestScore(2048)).unwrap(), "2048");
        assert_eq!(
            serde_json::from_str::<BestScore>("512").unwrap(),
            BestScore(512)
        );
    }

    #[test]
    fn seeds_parse_as_integers() {
        let props = GameProps {
            seed: Some("42".to_string()),
            ..GameProps::default()
        };
        assert_eq!(props.forced_seed(), Some(42));

        let props = GameProps {
            seed: Some("banana".to_string()),
            ..GameProps::default()
        };
        assert_eq!(props.forced_seed(), None);
    }
}
