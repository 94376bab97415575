use rand::Rng;

use crate::*;

/// Chance that a spawned tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Spawn {
    pub coords: Coord2,
    pub tile: Tile,
}

/// Places a 2 or a 4 on an empty cell picked uniformly, returning `None` when the board is full.
pub fn spawn_random<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Option<Spawn> {
    let empty_cells = grid.empty_cells();
    if empty_cells.is_empty() {
        log::trace!("board full, nothing spawned");
        return None;
    }

    let coords = empty_cells[rng.random_range(0..empty_cells.len())];
    let tile = if rng.random_bool(FOUR_PROBABILITY) {
        4
    } else {
        2
    };
    grid.set_tile(coords, tile);

    Some(Spawn { coords, tile })
}
