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

//! Types that make up the game board.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ships::{Orientation, Ship, ShipSet, ShipType};

use self::grid::Grid;
pub use self::{
    coordinate::{Coordinate, BOARD_SIZE, NUM_CELLS},
    errors::{CannotPlaceReason, CannotShootReason, PlaceError, ShotError},
    setup::MAX_RANDOM_ATTEMPTS,
};

mod coordinate;
mod errors;
mod grid;
mod setup;

/// State of a board cell from the perspective of shots taken.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Nobody has fired at this cell.
    Unknown,
    /// A shot landed here and hit nothing.
    Miss,
    /// A shot landed here and hit a ship.
    Hit,
}

/// Result of a shot on a single player's board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// The shot did not hit anything.
    Miss,
    /// The shot hit the ship with the given type, but did not sink it.
    Hit(ShipType),
    /// The shot sank the ship with the given type, but the player has more ships left.
    Sunk(ShipType),
    /// The shot sank the ship with the given type, and all of the player's ships are now
    /// sunk.
    Defeated(ShipType),
}

impl ShotOutcome {
    /// Whether the shot hit a ship.
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }

    /// Whether the shot sank a ship.
    pub fn sunk(&self) -> bool {
        matches!(self, ShotOutcome::Sunk(_) | ShotOutcome::Defeated(_))
    }

    /// Get the type of the ship that was hit.
    pub fn ship(&self) -> Option<ShipType> {
        match *self {
            ShotOutcome::Miss => None,
            ShotOutcome::Hit(ship) | ShotOutcome::Sunk(ship) | ShotOutcome::Defeated(ship) => {
                Some(ship)
            }
        }
    }

    /// Get the type of the ship that was sunk by this shot, if any.
    pub fn sunk_ship(&self) -> Option<ShipType> {
        match *self {
            ShotOutcome::Sunk(ship) | ShotOutcome::Defeated(ship) => Some(ship),
            _ => None,
        }
    }

    /// The cell state this shot leaves behind.
    pub fn cell_state(&self) -> CellState {
        if self.is_hit() {
            CellState::Hit
        } else {
            CellState::Miss
        }
    }
}

/// Optional placement restrictions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    /// Whether ships may touch each other, including diagonally.
    pub allow_adjacent: bool,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            allow_adjacent: true,
        }
    }
}

/// Represents a single player's board, including their ships and their side of the ocean.
#[derive(Debug, Clone)]
pub struct Board {
    /// Placement restrictions for this board.
    rules: PlacementRules,

    /// Grid of cells occupied by ships.
    grid: Grid,

    /// Ships in the order they were placed.
    ships: Vec<Ship>,

    /// Types of all placed ships.
    placed: ShipSet,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Construct an empty board with the default rules.
    pub fn new() -> Self {
        Self::with_rules(PlacementRules::default())
    }

    /// Construct an empty board with the given placement rules.
    pub fn with_rules(rules: PlacementRules) -> Self {
        Self {
            rules,
            grid: Grid::new(),
            ships: Vec::with_capacity(ShipType::ALL.len()),
            placed: ShipSet::empty(),
        }
    }

    /// Get the placement rules of this board.
    pub fn rules(&self) -> PlacementRules {
        self.rules
    }

    /// All ships on this board, in placement order.
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Get the ship with the given type, if placed.
    pub fn ship(&self, ship_type: ShipType) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.ship_type() == ship_type)
    }

    /// Get the ship occupying `coord`, if any.
    pub fn ship_at(&self, coord: Coordinate) -> Option<&Ship> {
        self.grid
            .get(coord)
            .and_then(|cell| cell.ship)
            .map(|idx| &self.ships[idx])
    }

    /// Ship types already on the board.
    pub fn placed(&self) -> ShipSet {
        self.placed
    }

    /// Ship types of the standard fleet not yet on the board.
    pub fn pending(&self) -> ShipSet {
        let mut pending = ShipSet::all();
        pending.remove(self.placed);
        pending
    }

    /// Whether one of every fleet ship has been placed.
    pub fn is_fleet_complete(&self) -> bool {
        self.pending().is_empty()
    }

    /// Check if the given ship could be placed, without placing it.
    pub fn check_placement(&self, ship: &Ship) -> Result<(), CannotPlaceReason> {
        if self.placed.contains(ship.ship_type()) {
            return Err(CannotPlaceReason::AlreadyPlaced);
        }
        if !ship.in_bounds() {
            return Err(CannotPlaceReason::OutOfBounds);
        }
        if ship.coords().iter().any(|&coord| self.grid[coord].ship.is_some()) {
            return Err(CannotPlaceReason::Overlap);
        }
        if !self.rules.allow_adjacent
            && ship
                .coords()
                .iter()
                .flat_map(|coord| coord.neighbors())
                .any(|coord| self.grid[coord].ship.is_some())
        {
            return Err(CannotPlaceReason::Adjacent);
        }
        Ok(())
    }

    /// Check whether a ship of the given type fits at the given position.
    pub fn can_place(&self, ship_type: ShipType, start: Coordinate, dir: Orientation) -> bool {
        self.check_placement(&Ship::new(ship_type, start, dir)).is_ok()
    }

    /// Try to place the specified ship at the specified position, returning an error if
    /// placement is not possible. The board is unchanged on failure.
    pub fn place_ship(
        &mut self,
        ship_type: ShipType,
        start: Coordinate,
        dir: Orientation,
    ) -> Result<&Ship, PlaceError> {
        self.place(Ship::new(ship_type, start, dir))
    }

    /// Try to place an already-projected ship.
    pub fn place(&mut self, ship: Ship) -> Result<&Ship, PlaceError> {
        if let Err(reason) = self.check_placement(&ship) {
            debug!(
                ship_type = %ship.ship_type(),
                row = ship.start().row,
                col = ship.start().col,
                orientation = ?ship.orientation(),
                %reason,
                "ship_placement_failed"
            );
            return Err(PlaceError::new(reason, ship));
        }
        // Every coordinate was checked in bounds and unoccupied above.
        let idx = self.ships.len();
        for &coord in ship.coords() {
            self.grid[coord].ship = Some(idx);
        }
        debug!(
            ship_type = %ship.ship_type(),
            row = ship.start().row,
            col = ship.start().col,
            orientation = ?ship.orientation(),
            "ship_placed"
        );
        self.placed.insert(ship.ship_type());
        self.ships.push(ship);
        Ok(&self.ships[idx])
    }

    /// Remove the ship of the given type from the board. Returns the removed ship, or
    /// `None` if it was not placed.
    pub fn unplace_ship(&mut self, ship_type: ShipType) -> Option<Ship> {
        let idx = self
            .ships
            .iter()
            .position(|ship| ship.ship_type() == ship_type)?;
        let ship = self.ships.remove(idx);
        for &coord in ship.coords() {
            self.grid[coord].ship = None;
        }
        // Ships after the removed one shifted down by one.
        for later in &self.ships[idx..] {
            for &coord in later.coords() {
                self.grid[coord].ship = self.grid[coord].ship.map(|i| i - 1);
            }
        }
        self.placed.remove(ship_type);
        Some(ship)
    }

    /// Remove every ship and every shot record.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.ships.clear();
        self.placed = ShipSet::empty();
    }

    /// Fire a shot at this board, returning the reason the shot was rejected or the
    /// result of the shot. The board is unchanged when the shot is rejected.
    pub fn receive_shot(&mut self, coord: Coordinate) -> Result<ShotOutcome, ShotError> {
        let hit_ship = match self.grid.get_mut(coord) {
            None => {
                debug!(row = coord.row, col = coord.col, "shot_out_of_bounds");
                return Err(ShotError::new(CannotShootReason::OutOfBounds, coord));
            }
            Some(cell) if cell.state != CellState::Unknown => {
                debug!(row = coord.row, col = coord.col, "shot_duplicate");
                return Err(ShotError::new(CannotShootReason::AlreadyShot, coord));
            }
            Some(cell) => {
                cell.state = if cell.ship.is_some() {
                    CellState::Hit
                } else {
                    CellState::Miss
                };
                cell.ship
            }
        };
        let outcome = match hit_ship {
            None => ShotOutcome::Miss,
            Some(idx) => {
                let ship = &mut self.ships[idx];
                ship.record_hit(coord);
                let ship_type = ship.ship_type();
                if !ship.is_sunk() {
                    ShotOutcome::Hit(ship_type)
                } else if self.all_ships_sunk() {
                    ShotOutcome::Defeated(ship_type)
                } else {
                    ShotOutcome::Sunk(ship_type)
                }
            }
        };
        trace!(row = coord.row, col = coord.col, ?outcome, "shot_received");
        Ok(outcome)
    }

    /// Return the state of a cell after shots have been taken. Out of bounds cells are
    /// always [`CellState::Unknown`].
    pub fn cell_state(&self, coord: Coordinate) -> CellState {
        self.grid
            .get(coord)
            .map_or(CellState::Unknown, |cell| cell.state)
    }

    /// Whether a shot has already been fired at `coord`.
    pub fn is_targeted(&self, coord: Coordinate) -> bool {
        self.cell_state(coord) != CellState::Unknown
    }

    /// Iterate every targeted cell and its result in row-major order.
    pub fn shots(&self) -> impl '_ + Iterator<Item = (Coordinate, CellState)> {
        self.grid
            .iter()
            .filter(|(_, cell)| cell.state != CellState::Unknown)
            .map(|(coord, cell)| (coord, cell.state))
    }

    /// Number of shots received.
    pub fn shot_count(&self) -> usize {
        self.shots().count()
    }

    /// Returns true if ships have been placed and all of them have been sunk.
    pub fn all_ships_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }
}
