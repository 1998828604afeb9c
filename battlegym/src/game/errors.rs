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
use thiserror::Error;

use crate::{
    board::{CannotShootReason, Coordinate, PlaceError, ShotError},
    game::{GamePhase, Player},
};

/// Reason a move was rejected. No variant mutates the game or passes the turn.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum MoveError {
    /// Moves are only accepted while the game is in progress.
    #[error("the game is not in progress (phase: {phase:?})")]
    NotInProgress { phase: GamePhase },

    /// The player attempted to shoot out of turn.
    #[error("it is {expected:?}'s turn, not {actual:?}'s")]
    WrongPlayer { expected: Player, actual: Player },

    /// The target coordinate is off the board.
    #[error("the target coordinate {0} is out of bounds")]
    OutOfBounds(Coordinate),

    /// The target cell was already shot.
    #[error("cell {0} already targeted")]
    DuplicateShot(Coordinate),
}

impl From<ShotError> for MoveError {
    fn from(err: ShotError) -> Self {
        match err.reason() {
            CannotShootReason::OutOfBounds => MoveError::OutOfBounds(err.coord()),
            CannotShootReason::AlreadyShot => MoveError::DuplicateShot(err.coord()),
        }
    }
}

/// Reason a setup operation was rejected.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SetupError {
    /// Ships can only be arranged while the game is in setup.
    #[error("the game has already started (phase: {0:?})")]
    AlreadyStarted(GamePhase),

    /// The ship could not be placed.
    #[error(transparent)]
    Placement(#[from] PlaceError),

    /// The game cannot start until this player's fleet is complete.
    #[error("{0:?} has not placed all of their ships")]
    FleetIncomplete(Player),
}
