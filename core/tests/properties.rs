use rand::SeedableRng;
use rand::rngs::SmallRng;
use twofold_core::*;

fn engine_from(rows: &[&[Tile]], seed: u64) -> GridEngine<SmallRng> {
    GridEngine::from_grid(
        Grid::from_rows(rows).unwrap(),
        0,
        SmallRng::seed_from_u64(seed),
    )
}

/// Plays `count` board-changing moves, cycling through directions, and returns the snapshots taken before each.
fn play_moves(engine: &mut GridEngine<SmallRng>, count: usize) -> Vec<(Grid, Score)> {
    let mut before = Vec::new();
    let mut directions = Direction::ALL.iter().cycle();
    while before.len() < count {
        assert!(!engine.is_over(), "game ended before {count} moves");
        let snapshot = (engine.grid().clone(), engine.score());
        let direction = *directions.next().unwrap();
        if engine.shift(direction).unwrap().changed {
            before.push(snapshot);
        }
    }
    before
}

#[test]
fn repeating_a_no_op_move_is_transparent() {
    let mut engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(11));
    // start with a full undo history so an eviction would show
    play_moves(&mut engine, HISTORY_LIMIT);
    assert_eq!(engine.history_len(), HISTORY_LIMIT);

    for direction in Direction::ALL {
        // push one way until the board stops changing
        let mut settled = false;
        for _ in 0..64 {
            if engine.is_over() {
                break;
            }
            if !engine.shift(direction).unwrap().changed {
                settled = true;
                break;
            }
        }
        if !settled {
            continue;
        }

        let before = engine.to_saved();

        let again = engine.shift(direction).unwrap();
        assert!(!again.changed);
        assert_eq!(again.score_gained, 0);
        assert_eq!(again.spawned, None);
        assert_eq!(engine.to_saved(), before);
        assert_eq!(engine.history_len(), HISTORY_LIMIT);
    }

    if !engine.is_over() {
        let undos = std::iter::from_fn(|| engine.undo().has_update().then_some(())).count();
        assert_eq!(undos, HISTORY_LIMIT);
    }
}

#[test]
fn score_gained_is_sum_of_merged_tiles() {
    let mut engine = engine_from(&[&[2, 2, 4, 4], &[8, 8, 8, 0], &[0, 0, 0, 0], &[16, 0, 16, 2]], 3);

    let slide = engine.slide(Direction::Left).unwrap();

    assert_eq!(slide.score_gained, 4 + 8 + 16 + 32);
    assert_eq!(engine.score(), slide.score_gained);
    assert_eq!(engine.grid().rows()[0], [4, 8, 0, 0]);
    assert_eq!(engine.grid().rows()[1], [16, 8, 0, 0]);
    assert_eq!(engine.grid().rows()[3], [32, 2, 0, 0]);
    assert_eq!(slide.merged, [(0, 0), (0, 1), (1, 0), (3, 0)]);
}

#[test]
fn score_never_decreases_across_moves() {
    let mut engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(99));
    let mut last = engine.score();

    for direction in Direction::ALL.iter().cycle().take(400) {
        if engine.is_over() {
            break;
        }
        engine.shift(*direction).unwrap();
        assert!(engine.score() >= last);
        last = engine.score();
    }
}

#[test]
fn spawn_never_overwrites_and_each_changing_move_adds_one_tile() {
    let mut engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(5));

    for direction in Direction::ALL.iter().cycle().take(200) {
        if engine.is_over() {
            break;
        }
        let before = engine.grid().clone();
        let outcome = engine.shift(*direction).unwrap();
        if let Some(spawn) = outcome.spawned {
            assert!(matches!(spawn.tile, 2 | 4));
            assert_eq!(engine.grid().tile_at(spawn.coords), spawn.tile);
        }
        if outcome.changed {
            assert!(outcome.spawned.is_some() || before.is_full());
        } else {
            assert_eq!(engine.grid(), &before);
        }
    }
}

#[test]
fn k_undos_restore_the_start_of_k_moves() {
    for k in [1, 4, HISTORY_LIMIT] {
        let mut engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(k as u64));
        let initial = (engine.grid().clone(), engine.score());

        play_moves(&mut engine, k);
        for _ in 0..k {
            assert_eq!(engine.undo(), UndoOutcome::Restored);
        }

        assert_eq!((engine.grid().clone(), engine.score()), initial);
        assert_eq!(engine.undo(), UndoOutcome::NoChange);
    }
}

#[test]
fn undo_reaches_back_only_ten_moves() {
    let mut engine = GridEngine::new(DEFAULT_SIZE, SmallRng::seed_from_u64(42));
    let initial = (engine.grid().clone(), engine.score());

    let before = play_moves(&mut engine, HISTORY_LIMIT + 1);
    let restored = (0..HISTORY_LIMIT + 1)
        .filter(|_| engine.undo().has_update())
        .count();

    assert_eq!(restored, HISTORY_LIMIT);
    assert_eq!((engine.grid().clone(), engine.score()), before[1]);
    assert_ne!(engine.grid().clone(), initial.0);
}

#[test]
fn two_by_two_terminal_detection() {
    assert!(!engine_from(&[&[2, 4], &[4, 2]], 0).can_move());
    assert!(engine_from(&[&[2, 2], &[4, 8]], 0).can_move());
}

#[test]
fn merging_the_top_left_pair() {
    let mut engine = engine_from(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]], 8);

    let outcome = engine.shift(Direction::Left).unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.score_gained, 4);
    assert_eq!(engine.grid().tile_at((0, 0)), 4);
    assert_eq!(engine.grid().count_empty(), 14);
    let spawn = outcome.spawned.unwrap();
    assert_ne!(spawn.coords, (0, 0));
    assert_eq!(outcome.state, EngineState::Playing);
}

#[test]
fn dead_board_ignores_every_move() {
    let rows: &[&[Tile]] = &[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]];
    let mut engine = engine_from(rows, 0);
    let grid = engine.grid().clone();

    for direction in Direction::ALL {
        assert_eq!(engine.shift(direction), Err(GameError::AlreadyEnded));
        assert!(engine.is_over());
        assert_eq!(engine.grid(), &grid);
        assert_eq!(engine.score(), 0);
    }
}

#[test]
fn engine_generalizes_to_larger_boards() {
    let mut engine = GridEngine::new(6, SmallRng::seed_from_u64(6));

    assert_eq!(engine.size(), 6);
    assert_eq!(engine.grid().count_empty(), 34);

    let changed = Direction::ALL
        .iter()
        .any(|&direction| engine.shift(direction).unwrap().changed);
    assert!(changed);
}

#[test]
fn session_moves_match_pure_moves() {
    let rows: &[&[Tile]] = &[&[2, 2, 4, 0], &[0, 4, 0, 4], &[8, 0, 0, 8], &[0, 0, 2, 2]];
    let mut pure = engine_from(rows, 21);
    let mut session = GameSession::new(engine_from(rows, 21), 0);
    let mut scheduler = ManualScheduler::new();

    for direction in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
        if pure.is_over() {
            break;
        }
        let outcome = pure.shift(direction).unwrap();
        let slide = session.begin_move(direction, &mut scheduler).unwrap();
        assert_eq!(slide.changed, outcome.changed);
        assert_eq!(slide.score_gained, outcome.score_gained);

        while let Some(event) = scheduler.next_event() {
            session.fire(event, &mut scheduler);
        }
        assert_eq!(session.engine().grid(), pure.grid());
        assert_eq!(session.engine().score(), pure.score());
    }
}
