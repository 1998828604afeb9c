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

//! Types used for defining ships and the standard fleet.
use std::{collections::BTreeSet, fmt};

use enumflags2::BitFlags;
use serde::{Deserialize, Serialize};

use crate::board::Coordinate;

pub use self::linear::Orientation;

mod linear;

/// Ship type for the standard fleet. Each player places exactly one of each.
///
/// The discriminants are bit flags so that sets of ship types can be held in a
/// [`ShipSet`]; they are unrelated to the ship lengths.
#[derive(BitFlags, Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShipType {
    /// Carrier: length 5.
    Carrier = 0b00001,
    /// Battleship: length 4.
    Battleship = 0b00010,
    /// Cruiser: length 3.
    Cruiser = 0b00100,
    /// Submarine: length 3.
    Submarine = 0b01000,
    /// Destroyer: length 2.
    Destroyer = 0b10000,
}

/// A set of ship types, e.g. the ships still awaiting placement.
pub type ShipSet = BitFlags<ShipType>;

/// Total number of cells occupied by a complete fleet.
pub const FLEET_CELLS: usize = 17;

impl ShipType {
    /// The standard fleet, in placement and action-encoding order.
    pub const ALL: &'static [ShipType] = &[
        ShipType::Carrier,
        ShipType::Battleship,
        ShipType::Cruiser,
        ShipType::Submarine,
        ShipType::Destroyer,
    ];

    /// Get the length of this ship type.
    pub fn len(self) -> usize {
        match self {
            ShipType::Carrier => 5,
            ShipType::Battleship => 4,
            ShipType::Cruiser => 3,
            ShipType::Submarine => 3,
            ShipType::Destroyer => 2,
        }
    }

    /// Position of this ship type in [`ShipType::ALL`].
    pub fn index(self) -> usize {
        match self {
            ShipType::Carrier => 0,
            ShipType::Battleship => 1,
            ShipType::Cruiser => 2,
            ShipType::Submarine => 3,
            ShipType::Destroyer => 4,
        }
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            ShipType::Carrier => "carrier",
            ShipType::Battleship => "battleship",
            ShipType::Cruiser => "cruiser",
            ShipType::Submarine => "submarine",
            ShipType::Destroyer => "destroyer",
        }
    }

    /// Iterate the members of `set` in fleet order.
    pub fn iter_set(set: ShipSet) -> impl Iterator<Item = ShipType> {
        ShipType::ALL
            .iter()
            .copied()
            .filter(move |ship| set.contains(*ship))
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A ship placed on a board.
///
/// The occupied coordinates are derived from the start, orientation and length when the
/// ship is constructed. A ship built with [`Ship::new`] may extend off the board; the
/// board rejects such ships at placement time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Ship {
    ship_type: ShipType,
    start: Coordinate,
    orientation: Orientation,
    coords: Vec<Coordinate>,
    hits: BTreeSet<Coordinate>,
}

impl Ship {
    /// Project a ship of the given type from `start` along `orientation`.
    pub fn new(ship_type: ShipType, start: Coordinate, orientation: Orientation) -> Self {
        Self {
            ship_type,
            start,
            orientation,
            coords: linear::project(start, orientation, ship_type.len()),
            hits: BTreeSet::new(),
        }
    }

    pub fn ship_type(&self) -> ShipType {
        self.ship_type
    }

    pub fn start(&self) -> Coordinate {
        self.start
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The occupied coordinates, ordered from the start cell.
    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    /// The coordinates of this ship that have been hit.
    pub fn hits(&self) -> impl '_ + Iterator<Item = Coordinate> {
        self.hits.iter().copied()
    }

    /// Number of distinct cells of this ship that have been hit.
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Check if this ship has been sunk.
    pub fn is_sunk(&self) -> bool {
        self.hits.len() == self.coords.len()
    }

    /// Whether this ship occupies `coord`.
    pub fn occupies(&self, coord: Coordinate) -> bool {
        self.coords.contains(&coord)
    }

    /// Whether every occupied cell lies on the board.
    pub fn in_bounds(&self) -> bool {
        self.coords.iter().all(Coordinate::in_bounds)
    }

    /// Whether this ship shares any cell with `other`.
    pub fn overlaps(&self, other: &Ship) -> bool {
        self.coords.iter().any(|coord| other.occupies(*coord))
    }

    /// Record a hit on `coord`. Returns false if the coordinate is not part of this ship
    /// or was already hit.
    pub(crate) fn record_hit(&mut self, coord: Coordinate) -> bool {
        self.occupies(coord) && self.hits.insert(coord)
    }
}
