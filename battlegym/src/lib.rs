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

//! Deterministic two-player Battleship and a single-agent training environment around it.
//!
//! [`game::BattleshipGame`] enforces the rules and rejects every illegal operation with a
//! typed error, leaving its state untouched. [`env::BattleshipEnv`] turns a game into a
//! `reset`/`step` decision process with a flat discrete action space, multi-channel
//! observations, an action mask and shaped rewards.
//!
//! ```
//! use battlegym::env::{BattleshipEnv, EnvConfig};
//!
//! let mut env = BattleshipEnv::new(EnvConfig::default()).unwrap();
//! let reset = env.reset(Some(7)).unwrap();
//! let action = reset.info.action_mask.legal_actions().next().unwrap();
//! let step = env.step(action).unwrap();
//! assert!(!step.info.invalid_action);
//! ```

pub mod board;
pub mod env;
pub mod game;
pub mod ships;

pub use crate::{
    board::{Board, CellState, Coordinate, ShotOutcome},
    env::{BattleshipEnv, EnvConfig},
    game::{BattleshipGame, GamePhase, Player},
    ships::{Orientation, ShipType},
};
