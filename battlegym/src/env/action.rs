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

//! Flat discrete action encoding.
//!
//! Indices `0..100` fire at `(i / 10, i % 10)`. When placement is enabled, the indices
//! after that are grouped by ship type, then orientation, then start cell:
//! `100 + ship * 200 + orientation * 100 + cell`.
use serde::{Deserialize, Serialize};

use crate::{
    board::{Coordinate, NUM_CELLS},
    ships::{Orientation, ShipType},
};

/// Number of placement indices for a single ship type.
pub const PLACEMENT_PER_SHIP: usize = NUM_CELLS * 2;

/// A decoded action.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Shoot at the given cell of the opposing board.
    Fire(Coordinate),
    /// Place a ship on the actor's own board.
    Place {
        ship_type: ShipType,
        start: Coordinate,
        orientation: Orientation,
    },
}

/// The discrete action space. Its size is fixed when the environment is built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ActionSpace {
    placement: bool,
}

impl ActionSpace {
    pub fn new(placement: bool) -> Self {
        Self { placement }
    }

    /// Whether placement indices exist.
    pub fn has_placement(&self) -> bool {
        self.placement
    }

    /// Number of discrete actions.
    pub fn size(&self) -> usize {
        if self.placement {
            NUM_CELLS + ShipType::ALL.len() * PLACEMENT_PER_SHIP
        } else {
            NUM_CELLS
        }
    }

    /// Decode an index. Every index below [`size`][Self::size] decodes; nothing else does.
    pub fn decode(&self, index: usize) -> Option<Action> {
        if index < NUM_CELLS {
            return Some(Action::Fire(Coordinate::from_index(index)));
        }
        if index >= self.size() {
            return None;
        }
        let offset = index - NUM_CELLS;
        let ship_type = ShipType::ALL[offset / PLACEMENT_PER_SHIP];
        let rem = offset % PLACEMENT_PER_SHIP;
        Some(Action::Place {
            ship_type,
            orientation: Orientation::ALL[rem / NUM_CELLS],
            start: Coordinate::from_index(rem % NUM_CELLS),
        })
    }

    /// Inverse of [`decode`][Self::decode]. Returns `None` for actions outside this space.
    pub fn encode(&self, action: &Action) -> Option<usize> {
        match *action {
            Action::Fire(coord) => coord.to_index(),
            Action::Place {
                ship_type,
                start,
                orientation,
            } if self.placement => start.to_index().map(|cell| {
                NUM_CELLS
                    + ship_type.index() * PLACEMENT_PER_SHIP
                    + orientation.index() * NUM_CELLS
                    + cell
            }),
            Action::Place { .. } => None,
        }
    }
}

/// Legality of every index of an [`ActionSpace`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionMask {
    legal: Vec<bool>,
}

impl ActionMask {
    /// A mask of the given size with nothing legal.
    pub fn none(size: usize) -> Self {
        Self {
            legal: vec![false; size],
        }
    }

    pub(crate) fn allow(&mut self, index: usize) {
        if let Some(slot) = self.legal.get_mut(index) {
            *slot = true;
        }
    }

    /// Whether `index` is legal. Out of range indices never are.
    pub fn is_legal(&self, index: usize) -> bool {
        self.legal.get(index).copied().unwrap_or(false)
    }

    /// Iterate the legal indices in ascending order.
    pub fn legal_actions(&self) -> impl '_ + Iterator<Item = usize> {
        self.legal
            .iter()
            .enumerate()
            .filter(|(_, legal)| **legal)
            .map(|(index, _)| index)
    }

    pub fn count_legal(&self) -> usize {
        self.legal.iter().filter(|&&legal| legal).count()
    }

    pub fn any(&self) -> bool {
        self.legal.iter().any(|&legal| legal)
    }

    pub fn len(&self) -> usize {
        self.legal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legal.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.legal
    }
}
