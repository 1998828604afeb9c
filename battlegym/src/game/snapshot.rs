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

//! Plain-data views of a game, safe to serialize.
//!
//! [`GameSnapshot`] is omniscient and meant for replay and telemetry. [`PlayerView`] is
//! what a single player is allowed to see: the opponent's ships only show up once sunk.
use serde::{Deserialize, Serialize};

use crate::{
    board::{Board, CellState, Coordinate},
    game::{GamePhase, Player},
    ships::{Orientation, Ship, ShipType},
};

/// A placed ship and its damage.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShipSnapshot {
    pub ship_type: ShipType,
    pub start: Coordinate,
    pub orientation: Orientation,
    pub coords: Vec<Coordinate>,
    pub hits: Vec<Coordinate>,
    pub sunk: bool,
}

impl From<&Ship> for ShipSnapshot {
    fn from(ship: &Ship) -> Self {
        Self {
            ship_type: ship.ship_type(),
            start: ship.start(),
            orientation: ship.orientation(),
            coords: ship.coords().to_vec(),
            hits: ship.hits().collect(),
            sunk: ship.is_sunk(),
        }
    }
}

/// A targeted cell and its result.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub coord: Coordinate,
    pub state: CellState,
}

/// Ships and shots of one board.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Ships in placement order. Redacted snapshots only contain sunk ships.
    pub ships: Vec<ShipSnapshot>,
    /// Shots received, in row-major order.
    pub shots: Vec<ShotRecord>,
}

impl BoardSnapshot {
    /// Snapshot every ship on the board.
    pub fn full(board: &Board) -> Self {
        Self::build(board, |_| true)
    }

    /// Snapshot the board as seen by the opponent: only sunk ships are revealed.
    pub fn redacted(board: &Board) -> Self {
        Self::build(board, Ship::is_sunk)
    }

    fn build(board: &Board, reveal: impl Fn(&Ship) -> bool) -> Self {
        Self {
            ships: board
                .ships()
                .iter()
                .filter(|ship| reveal(*ship))
                .map(ShipSnapshot::from)
                .collect(),
            shots: board
                .shots()
                .map(|(coord, state)| ShotRecord { coord, state })
                .collect(),
        }
    }
}

/// Full state of a game.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub current_player: Player,
    pub winner: Option<Player>,
    pub player_one: BoardSnapshot,
    pub player_two: BoardSnapshot,
}

impl GameSnapshot {
    /// Get the snapshot of the given player's board.
    pub fn board(&self, player: Player) -> &BoardSnapshot {
        match player {
            Player::P1 => &self.player_one,
            Player::P2 => &self.player_two,
        }
    }
}

/// The game from one player's perspective.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player: Player,
    pub phase: GamePhase,
    pub current_player: Player,
    pub winner: Option<Player>,
    /// The player's own board, fully visible.
    pub own: BoardSnapshot,
    /// The opponent's board with unsunk ships hidden.
    pub opponent: BoardSnapshot,
}
