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

//! Defines the cells that make up a single board.

use std::ops::{Index, IndexMut};

use crate::board::{CellState, Coordinate, NUM_CELLS};

/// A single cell in the player's grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) struct GridCell {
    /// Index into the board's ship list of the ship that occupies this cell, if any.
    pub(super) ship: Option<usize>,

    /// Result of shots fired at this cell.
    pub(super) state: CellState,
}

impl Default for GridCell {
    fn default() -> Self {
        Self {
            ship: None,
            state: CellState::Unknown,
        }
    }
}

/// Row-major storage for the cells of a board.
#[derive(Debug, Clone)]
pub(super) struct Grid {
    cells: Box<[GridCell]>,
}

impl Grid {
    pub(super) fn new() -> Self {
        let cells = (0..NUM_CELLS).map(|_| Default::default()).collect();
        Self { cells }
    }

    /// Get a reference to the cell at the given [`Coordinate`].
    pub(super) fn get(&self, coord: Coordinate) -> Option<&GridCell> {
        coord.to_index().and_then(|i| self.cells.get(i))
    }

    /// Get a mutable reference to the cell at the given [`Coordinate`].
    pub(super) fn get_mut(&mut self, coord: Coordinate) -> Option<&mut GridCell> {
        coord.to_index().and_then(move |i| self.cells.get_mut(i))
    }

    /// Iterate all cells with their coordinates in row-major order.
    pub(super) fn iter(&self) -> impl '_ + Iterator<Item = (Coordinate, &GridCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (Coordinate::from_index(i), cell))
    }

    /// Reset every cell to empty and unshot.
    pub(super) fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = GridCell::default();
        }
    }
}

impl Index<Coordinate> for Grid {
    type Output = GridCell;

    fn index(&self, coord: Coordinate) -> &Self::Output {
        self.get(coord).expect("coordinate out of bounds")
    }
}

impl IndexMut<Coordinate> for Grid {
    fn index_mut(&mut self, coord: Coordinate) -> &mut Self::Output {
        self.get_mut(coord).expect("coordinate out of bounds")
    }
}
