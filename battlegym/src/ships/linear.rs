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
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use serde::{Deserialize, Serialize};

use crate::board::Coordinate;

/// Placement orientation of a ship. Ships always extend right (horizontal) or down
/// (vertical) from their start coordinate.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Every orientation, in action-encoding order.
    pub const ALL: &'static [Orientation] = &[Orientation::Horizontal, Orientation::Vertical];

    /// Position of this orientation in [`Orientation::ALL`].
    pub fn index(self) -> usize {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }

    /// Step `dist` cells from `start` along this orientation. The result is not bounds
    /// checked. Saturates at `usize::MAX`, which is never on the board.
    fn step(self, start: Coordinate, dist: usize) -> Coordinate {
        match self {
            Orientation::Horizontal => Coordinate::new(start.row, start.col.saturating_add(dist)),
            Orientation::Vertical => Coordinate::new(start.row.saturating_add(dist), start.col),
        }
    }
}

impl Distribution<Orientation> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Orientation {
        if rng.gen::<bool>() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// Project a straight line of `len` cells from `start` along `orientation`. Cells past
/// the edge of the board are included as-is so the caller can reject them.
pub(crate) fn project(start: Coordinate, orientation: Orientation, len: usize) -> Vec<Coordinate> {
    (0..len).map(|dist| orientation.step(start, dist)).collect()
}
