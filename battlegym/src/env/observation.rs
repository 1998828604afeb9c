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

//! Multi-channel 10x10 observation tensors.
use serde::{Deserialize, Serialize};

use crate::{
    board::{CellState, Coordinate, BOARD_SIZE, NUM_CELLS},
    game::{BattleshipGame, Player},
    ships::{ShipSet, ShipType},
};

/// Channels present in every observation.
pub const BASE_CHANNELS: usize = 6;

/// Cells occupied by the observer's ships.
pub const OWN_SHIPS: usize = 0;
/// Cells of the observer's ships that were hit.
pub const OWN_DAMAGE: usize = 1;
/// Cells the observer has fired at.
pub const SHOTS_FIRED: usize = 2;
/// Hits among the cells the observer has fired at.
pub const SHOTS_HIT: usize = 3;
/// One-hot location of the enemy's most recent shot.
pub const LAST_ENEMY_SHOT: usize = 4;
/// Whole plane set to the parity of the step counter.
pub const STEP_PARITY: usize = 5;
/// First of the per-ship pending planes, present only with agent placement.
pub const PENDING_SHIPS: usize = BASE_CHANNELS;
/// Placement phase indicator, present only with agent placement.
pub const PLACEMENT_PHASE: usize = BASE_CHANNELS + ShipType::ALL.len();

/// Number of channels for the given placement mode.
pub fn num_channels(agent_placement: bool) -> usize {
    if agent_placement {
        BASE_CHANNELS + ShipType::ALL.len() + 1
    } else {
        BASE_CHANNELS
    }
}

/// A `(channels, 10, 10)` tensor stored channel-major with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    channels: usize,
    data: Vec<f32>,
}

impl Observation {
    /// An all-zero observation with the given channel count.
    pub fn zeros(channels: usize) -> Self {
        Self {
            channels,
            data: vec![0.0; channels * NUM_CELLS],
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(channels, rows, cols)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, BOARD_SIZE, BOARD_SIZE)
    }

    /// Value at the given channel and cell. Out of range lookups read as zero.
    pub fn get(&self, channel: usize, coord: Coordinate) -> f32 {
        match coord.to_index() {
            Some(cell) if channel < self.channels => self.data[channel * NUM_CELLS + cell],
            _ => 0.0,
        }
    }

    /// The 100 row-major values of one channel, or `None` past the last channel.
    pub fn plane(&self, channel: usize) -> Option<&[f32]> {
        if channel < self.channels {
            self.data.get(channel * NUM_CELLS..(channel + 1) * NUM_CELLS)
        } else {
            None
        }
    }

    /// Flat channel-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    fn set(&mut self, channel: usize, coord: Coordinate) {
        if let Some(cell) = coord.to_index() {
            self.data[channel * NUM_CELLS + cell] = 1.0;
        }
    }

    fn fill(&mut self, channel: usize, value: f32) {
        for v in &mut self.data[channel * NUM_CELLS..(channel + 1) * NUM_CELLS] {
            *v = value;
        }
    }
}

/// Placement planes of an observation.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PlacementPlanes {
    /// Ships the observer has not placed yet.
    pub pending: ShipSet,
    /// Whether the observer is placing ships.
    pub active: bool,
}

/// Encode the game from `player`'s perspective.
pub(crate) fn encode(
    game: &BattleshipGame,
    player: Player,
    last_enemy_shot: Option<Coordinate>,
    step_count: usize,
    placement: Option<PlacementPlanes>,
) -> Observation {
    let mut obs = Observation::zeros(num_channels(placement.is_some()));

    let own = game.board(player);
    for ship in own.ships() {
        for &coord in ship.coords() {
            obs.set(OWN_SHIPS, coord);
            if own.cell_state(coord) == CellState::Hit {
                obs.set(OWN_DAMAGE, coord);
            }
        }
    }

    for (coord, state) in game.board(player.opponent()).shots() {
        obs.set(SHOTS_FIRED, coord);
        if state == CellState::Hit {
            obs.set(SHOTS_HIT, coord);
        }
    }

    if let Some(coord) = last_enemy_shot {
        obs.set(LAST_ENEMY_SHOT, coord);
    }

    obs.fill(STEP_PARITY, (step_count % 2) as f32);

    if let Some(planes) = placement {
        for &ship_type in ShipType::ALL {
            if planes.pending.contains(ship_type) {
                obs.fill(PENDING_SHIPS + ship_type.index(), 1.0);
            }
        }
        if planes.active {
            obs.fill(PLACEMENT_PHASE, 1.0);
        }
    }
    obs
}
