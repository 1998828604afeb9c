// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of every board.
pub const BOARD_SIZE: usize = 10;

/// Number of cells on a board.
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// The coordinates of a cell in the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Vertical position of the cell.
    pub row: usize,
    /// Horizontal position of the cell.
    pub col: usize,
}

impl Coordinate {
    /// Construct a [`Coordinate`] from the given `row` and `col`.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether this coordinate lies on a 10x10 board.
    #[inline]
    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Row-major linear index of this coordinate. Returns `None` if the coordinate is out
    /// of bounds.
    #[inline]
    pub fn to_index(&self) -> Option<usize> {
        if self.in_bounds() {
            Some(self.row * BOARD_SIZE + self.col)
        } else {
            None
        }
    }

    /// Convert a row-major linear index back into a [`Coordinate`]. Indexes past the end
    /// of the board produce out of bounds coordinates.
    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self::new(idx / BOARD_SIZE, idx % BOARD_SIZE)
    }

    /// Iterate every coordinate on the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..NUM_CELLS).map(Coordinate::from_index)
    }

    /// Iterate the in-bounds cells in the 8-neighbourhood of this coordinate.
    pub fn neighbors(self) -> impl Iterator<Item = Coordinate> {
        const DELTAS: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        fn shift(value: usize, delta: isize) -> Option<usize> {
            match delta {
                -1 => value.checked_sub(1),
                1 => value.checked_add(1),
                _ => Some(value),
            }
        }
        DELTAS.iter().filter_map(move |&(dr, dc)| {
            let coord = Coordinate::new(shift(self.row, dr)?, shift(self.col, dc)?);
            if coord.in_bounds() {
                Some(coord)
            } else {
                None
            }
        })
    }
}

impl From<(usize, usize)> for Coordinate {
    /// Construct a [`Coordinate`] from the given `(row, col)` pair.
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl From<Coordinate> for (usize, usize) {
    /// Convert the [`Coordinate`] into a `(row, col)` pair.
    fn from(coord: Coordinate) -> Self {
        (coord.row, coord.col)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
