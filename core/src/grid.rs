use alloc::vec::Vec;
use ndarray::{Array2, ArrayViewMut1, s};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Square board of tiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Tile>,
}

impl Grid {
    /// Empty board with `size` rows and columns, at least one.
    pub fn new(size: Coord) -> Self {
        let size = usize::from(size.max(1));
        Self {
            cells: Array2::zeros((size, size)),
        }
    }

    pub fn from_rows<T: AsRef<[Tile]>>(rows: &[T]) -> Result<Self> {
        let size = rows.len();
        if size == 0 || size > usize::from(Coord::MAX) {
            return Err(GameError::InvalidBoardShape);
        }

        let mut cells = Array2::zeros((size, size));
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != size {
                return Err(GameError::InvalidBoardShape);
            }
            for (col, &tile) in values.iter().enumerate() {
                cells[[row, col]] = tile;
            }
        }

        let grid = Self { cells };
        grid.validate()?;
        Ok(grid)
    }

    /// Checks the invariants a deserialized grid might not hold.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.cells.dim();
        if rows == 0 || rows != cols || rows > usize::from(Coord::MAX) {
            return Err(GameError::InvalidBoardShape);
        }
        if self.cells.iter().all(|&tile| is_valid_tile(tile)) {
            Ok(())
        } else {
            Err(GameError::InvalidTile)
        }
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size && coords.1 < size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord {
        self.cells.nrows() as Coord
    }

    /// Panics when `coords` is outside the board.
    pub fn tile_at(&self, coords: Coord2) -> Tile {
        self.cells[coords.to_nd_index()]
    }

    pub(crate) fn set_tile(&mut self, coords: Coord2, tile: Tile) {
        debug_assert!(is_valid_tile(tile));
        self.cells[coords.to_nd_index()] = tile;
    }

    pub fn iter_tiles(&self) -> impl Iterator<Item = (Coord2, Tile)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &tile)| ((row as Coord, col as Coord), tile))
    }

    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.cells.rows().into_iter().map(|row| row.to_vec()).collect()
    }

    pub fn empty_cells(&self) -> Vec<Coord2> {
        self.iter_tiles()
            .filter(|&(_, tile)| tile == 0)
            .map(|(coords, _)| coords)
            .collect()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&tile| tile == 0).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&tile| tile != 0)
    }

    pub fn max_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Whether any move could still change the board.
    ///
    /// Looking right and down from every cell covers every adjacent pair.
    pub fn can_move(&self) -> bool {
        let (rows, cols) = self.cells.dim();
        for ((row, col), &tile) in self.cells.indexed_iter() {
            if tile == 0 {
                return true;
            }
            if !can_merge(tile) {
                continue;
            }
            if col + 1 < cols && self.cells[[row, col + 1]] == tile {
                return true;
            }
            if row + 1 < rows && self.cells[[row + 1, col]] == tile {
                return true;
            }
        }
        false
    }

    /// Slides every line towards `direction`, merging equal neighbours once.
    pub(crate) fn slide(&mut self, direction: Direction) -> Slide {
        let size = self.size();
        let mut slide = Slide::default();

        for index in 0..size {
            let mut line = self.line_mut(direction, index);
            let merged = merge_line(line.iter().copied());

            for (cell, &tile) in line.iter_mut().zip(merged.tiles.iter()) {
                if *cell != tile {
                    slide.changed = true;
                    *cell = tile;
                }
            }

            slide.score_gained = slide.score_gained.saturating_add(merged.score_gained);
            slide.merged.extend(
                merged
                    .merged
                    .iter()
                    .map(|&offset| direction.cell(index, offset, size)),
            );
        }

        slide
    }

    /// View of line `index` ordered so that tiles travel towards offset `0`.
    fn line_mut(&mut self, direction: Direction, index: Coord) -> ArrayViewMut1<'_, Tile> {
        use Direction::*;
        let index = usize::from(index);
        match direction {
            Left => self.cells.slice_mut(s![index, ..]),
            Right => self.cells.slice_mut(s![index, ..;-1]),
            Up => self.cells.slice_mut(s![.., index]),
            Down => self.cells.slice_mut(s![..;-1, index]),
        }
    }
}

const fn can_merge(tile: Tile) -> bool {
    tile.checked_mul(2).is_some()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedLine {
    /// Same length as the input, zero padded at the end.
    pub tiles: SmallVec<[Tile; 8]>,
    pub score_gained: Score,
    /// Offsets in `tiles` produced by a merge.
    pub merged: SmallVec<[Coord; 4]>,
}

/// Compacts a line towards offset `0` and merges adjacent equal tiles.
///
/// A merged tile never merges again in the same pass, so `[2, 2, 2, 2]` becomes `[4, 4, 0, 0]`.
/// The largest representable tile has no double and never merges.
pub fn merge_line<I: IntoIterator<Item = Tile>>(line: I) -> MergedLine {
    let mut len = 0;
    let compacted: SmallVec<[Tile; 8]> = line
        .into_iter()
        .inspect(|_| len += 1)
        .filter(|&tile| tile != 0)
        .collect();

    let mut tiles = SmallVec::with_capacity(len);
    let mut merged = SmallVec::new();
    let mut score_gained: Score = 0;

    let mut pending = compacted.iter().copied().peekable();
    while let Some(tile) = pending.next() {
        match tile.checked_mul(2) {
            Some(doubled) if pending.next_if_eq(&tile).is_some() => {
                merged.push(tiles.len() as Coord);
                tiles.push(doubled);
                score_gained = score_gained.saturating_add(doubled);
            }
            _ => tiles.push(tile),
        }
    }
    tiles.resize(len, 0);

    MergedLine {
        tiles,
        score_gained,
        merged,
    }
}
