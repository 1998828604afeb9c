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

//! Text rendering of boards. Everything is drawn from [`BoardSnapshot`]s, so the
//! opponent's board can only ever show what a [`PlayerView`][battlegym::game::PlayerView]
//! reveals.
use std::fmt;

use battlegym::{
    board::{CellState, Coordinate, BOARD_SIZE, NUM_CELLS},
    game::BoardSnapshot,
    ShipType,
};

/// Row labels, `A` through `J`.
pub const ROW_LABELS: &[u8; BOARD_SIZE] = b"ABCDEFGHIJ";

/// What a single cell shows.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Cell {
    /// Open water, or a cell nobody has fired at on a hidden board.
    Water,
    /// A shot that hit nothing.
    Miss,
    /// A ship nobody has hit here yet.
    Ship(ShipType),
    /// A hit on a ship whose type is not revealed.
    Hit,
    /// A hit on a ship of the given type.
    HitShip(ShipType),
    /// A cell of a sunk ship.
    Sunk(ShipType),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Cell::Water => f.pad("~~"),
            Cell::Miss => f.pad("o"),
            Cell::Ship(ship) => f.pad(abbrev(ship)),
            Cell::Hit => f.pad("x"),
            Cell::HitShip(ship) => f.pad(&format!("x{}", abbrev(ship))),
            Cell::Sunk(ship) => f.pad(&format!("X{}", abbrev(ship))),
        }
    }
}

/// Two letter abbreviation of the ship type.
pub fn abbrev(ship: ShipType) -> &'static str {
    match ship {
        ShipType::Carrier => "cv",
        ShipType::Battleship => "bb",
        ShipType::Cruiser => "cl",
        ShipType::Submarine => "ss",
        ShipType::Destroyer => "dd",
    }
}

/// Lay out the cells of a board snapshot in row-major order.
pub fn cells(board: &BoardSnapshot) -> Vec<Cell> {
    let mut cells = vec![Cell::Water; NUM_CELLS];
    for shot in &board.shots {
        if let Some(idx) = shot.coord.to_index() {
            cells[idx] = match shot.state {
                CellState::Hit => Cell::Hit,
                CellState::Miss => Cell::Miss,
                CellState::Unknown => Cell::Water,
            };
        }
    }
    for ship in &board.ships {
        for coord in &ship.coords {
            if let Some(idx) = coord.to_index() {
                cells[idx] = if ship.sunk {
                    Cell::Sunk(ship.ship_type)
                } else if ship.hits.contains(coord) {
                    Cell::HitShip(ship.ship_type)
                } else {
                    Cell::Ship(ship.ship_type)
                };
            }
        }
    }
    cells
}

/// Render the board as a grid with column numbers and row letters.
pub fn render(board: &BoardSnapshot) -> String {
    let cells = cells(board);
    let mut out = String::from("   ");
    for col in 0..BOARD_SIZE {
        out.push_str(&format!("{:^4}", col));
    }
    out.push('\n');
    for (row, line) in cells.chunks(BOARD_SIZE).enumerate() {
        out.push_str(&format!("{:>2} ", ROW_LABELS[row] as char));
        for cell in line {
            out.push_str(&format!("{:^4}", cell));
        }
        out.push('\n');
    }
    out
}

/// Format a coordinate the way the player types it, e.g. `C7`.
pub fn label(coord: Coordinate) -> String {
    match ROW_LABELS.get(coord.row) {
        Some(&row) => format!("{}{}", row as char, coord.col),
        None => coord.to_string(),
    }
}
