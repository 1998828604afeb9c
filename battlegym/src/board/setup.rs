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

//! Implements the setup helpers of the board.
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::{
    board::{Board, CannotPlaceReason, Coordinate, PlaceError, BOARD_SIZE},
    ships::{Orientation, Ship, ShipType},
};

/// Sampled attempts per ship before choosing among the remaining legal placements.
pub const MAX_RANDOM_ATTEMPTS: usize = 1000;

impl Board {
    /// Randomly place every fleet ship that is not on the board yet, in fleet order.
    ///
    /// Each attempt draws an orientation, then a start row, then a start column, and is
    /// retried until it fits. After [`MAX_RANDOM_ATTEMPTS`] misses the ship is placed at a
    /// uniformly chosen legal position instead. The result depends only on the state of
    /// `rng`.
    ///
    /// Fails with [`CannotPlaceReason::InsufficientSpace`] if a ship has no legal position
    /// left. Ships placed before the failure stay on the board.
    pub fn random_placement<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), PlaceError> {
        for ship_type in ShipType::iter_set(self.pending()) {
            self.random_ship_placement(ship_type, rng)?;
        }
        Ok(())
    }

    fn random_ship_placement<R: Rng + ?Sized>(
        &mut self,
        ship_type: ShipType,
        rng: &mut R,
    ) -> Result<(), PlaceError> {
        let mut last = Ship::new(ship_type, Coordinate::new(0, 0), Orientation::Horizontal);
        for attempts in 1..=MAX_RANDOM_ATTEMPTS {
            let dir: Orientation = rng.gen();
            let start = Coordinate::new(rng.gen_range(0, BOARD_SIZE), rng.gen_range(0, BOARD_SIZE));
            match self.place_ship(ship_type, start, dir) {
                Ok(_) => {
                    debug!(ship_type = %ship_type, attempts, "random_ship_placed");
                    return Ok(());
                }
                Err(err) => last = err.into_ship(),
            }
        }

        let legal: Vec<(Orientation, Coordinate)> = self.legal_placements(ship_type).collect();
        match legal.choose(rng) {
            Some(&(dir, start)) => {
                debug!(
                    ship_type = %ship_type,
                    choices = legal.len(),
                    "random_ship_placed_from_legal"
                );
                self.place_ship(ship_type, start, dir).map(|_| ())
            }
            None => {
                debug!(ship_type = %ship_type, "random_ship_placement_no_room");
                Err(PlaceError::new(CannotPlaceReason::InsufficientSpace, last))
            }
        }
    }

    /// Iterate every `(orientation, start)` at which a ship of the given type could
    /// currently be placed, orientation-major then row-major.
    pub fn legal_placements(
        &self,
        ship_type: ShipType,
    ) -> impl '_ + Iterator<Item = (Orientation, Coordinate)> {
        Orientation::ALL
            .iter()
            .flat_map(|&dir| Coordinate::all().map(move |start| (dir, start)))
            .filter(move |&(dir, start)| self.can_place(ship_type, start, dir))
    }
}
