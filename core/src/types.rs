use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board size and positions.
pub type Coord = u8;

/// Two-dimensional coordinates `(row, column)`, `(0, 0)` being the top-left cell.
pub type Coord2 = (Coord, Coord);

/// Cell value, `0` for an empty cell, otherwise a power of two.
pub type Tile = u32;

pub type Score = u32;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn is_valid_tile(tile: Tile) -> bool {
    tile == 0 || (tile >= 2 && tile.is_power_of_two())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Maps position `offset` of line `line` back to board coordinates.
    ///
    /// Lines are read in the direction tiles travel towards: a `Left` line is a row read left to right, a `Down` line
    /// is a column read bottom to top, and so on. Offset `0` is always the cell tiles pile up against.
    pub const fn cell(self, line: Coord, offset: Coord, size: Coord) -> Coord2 {
        use Direction::*;
        let far = size - 1 - offset;
        match self {
            Left => (line, offset),
            Right => (line, far),
            Up => (offset, line),
            Down => (far, line),
        }
    }
}
