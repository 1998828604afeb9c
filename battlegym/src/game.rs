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

//! Implementation of the basic game of battleship with two players and five ships on a
//! 10x10 grid.
//!
//! A [`BattleshipGame`] moves through [`GamePhase::Setup`], where ships are placed
//! manually or at random, to [`GamePhase::InProgress`], where the players alternate
//! shots, and finally to [`GamePhase::Finished`] once a fleet is sunk. Phases never go
//! backwards and every rejected operation leaves the game untouched.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    board::{Board, Coordinate, PlacementRules, ShotOutcome},
    ships::{Orientation, ShipType},
};

pub use self::{
    errors::{MoveError, SetupError},
    snapshot::{BoardSnapshot, GameSnapshot, PlayerView, ShipSnapshot, ShotRecord},
};

mod errors;
mod snapshot;

/// Player ID for the game. Either `P1` or `P2`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    /// Both players, in seating order.
    pub const ALL: &'static [Player] = &[Player::P1, Player::P2];

    /// Get the opponent of this player.
    pub fn opponent(self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    fn index(self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }
}

/// High-level lifecycle of a match.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Setup,
    InProgress,
    Finished,
}

/// How the first player to move is chosen when the game starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum FirstPlayer {
    /// Always the given player.
    Fixed(Player),
    /// A coin flip drawn from the RNG passed to [`BattleshipGame::start`].
    Seeded,
}

impl Default for FirstPlayer {
    fn default() -> Self {
        FirstPlayer::Fixed(Player::P1)
    }
}

/// Rules shared by both boards of a game.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: PlacementRules,
    pub first_player: FirstPlayer,
}

/// Coordinates gameplay between two player boards.
#[derive(Debug, Clone)]
pub struct BattleshipGame {
    config: GameConfig,

    /// Boards indexed by [`Player::index`].
    boards: [Board; 2],

    phase: GamePhase,

    /// Player whose turn it is. Only meaningful once the game has started.
    current: Player,

    /// Set once the game is finished.
    winner: Option<Player>,
}

impl Default for BattleshipGame {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleshipGame {
    /// Create a game in setup with the default rules.
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    /// Create a game in setup with the given rules.
    pub fn with_config(config: GameConfig) -> Self {
        Self {
            config,
            boards: [
                Board::with_rules(config.rules),
                Board::with_rules(config.rules),
            ],
            phase: GamePhase::Setup,
            current: Player::P1,
            winner: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Get the player whose turn it currently is.
    pub fn current_player(&self) -> Player {
        self.current
    }

    /// Get the winner, if the game is finished.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Get the specified player's board.
    pub fn board(&self, player: Player) -> &Board {
        &self.boards[player.index()]
    }

    fn board_mut(&mut self, player: Player) -> &mut Board {
        &mut self.boards[player.index()]
    }

    fn ensure_setup(&self) -> Result<(), SetupError> {
        match self.phase {
            GamePhase::Setup => Ok(()),
            phase => Err(SetupError::AlreadyStarted(phase)),
        }
    }

    /// Randomly place fleets for both players from an RNG seeded with `seed`, then start
    /// the game. The same seed always produces the same layouts.
    pub fn setup_random(&mut self, seed: u64) -> Result<Player, SetupError> {
        self.setup_random_with(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Randomly place fleets for both players, player one first, drawing from `rng`, then
    /// start the game. Any ships placed earlier are discarded.
    pub fn setup_random_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Player, SetupError> {
        self.ensure_setup()?;
        for &player in Player::ALL {
            let board = self.board_mut(player);
            board.clear();
            board.random_placement(rng)?;
            debug!(?player, "game_random_placement");
        }
        self.start(rng)
    }

    /// Place a ship for the given player during setup.
    pub fn place_ship(
        &mut self,
        player: Player,
        ship: ShipType,
        start: Coordinate,
        dir: Orientation,
    ) -> Result<(), SetupError> {
        self.ensure_setup()?;
        self.board_mut(player).place_ship(ship, start, dir)?;
        Ok(())
    }

    /// Clear the placement of the specified ship. Returns true if the ship was previously
    /// placed.
    pub fn unplace_ship(&mut self, player: Player, ship: ShipType) -> Result<bool, SetupError> {
        self.ensure_setup()?;
        Ok(self.board_mut(player).unplace_ship(ship).is_some())
    }

    /// Randomly place all of the given player's ships that are not placed yet. Fails with
    /// [`CannotPlaceReason::InsufficientSpace`][crate::board::CannotPlaceReason] when the
    /// ships already placed leave no room; those ships are kept.
    pub fn randomize_remaining<R: Rng + ?Sized>(
        &mut self,
        player: Player,
        rng: &mut R,
    ) -> Result<(), SetupError> {
        self.ensure_setup()?;
        self.board_mut(player).random_placement(rng)?;
        Ok(())
    }

    /// Start the game once both fleets are complete, returning the first player to move.
    /// `rng` is only drawn from when the first player is [`FirstPlayer::Seeded`].
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Player, SetupError> {
        self.ensure_setup()?;
        if let Some(&player) = Player::ALL
            .iter()
            .find(|&&player| !self.board(player).is_fleet_complete())
        {
            return Err(SetupError::FleetIncomplete(player));
        }
        let first = match self.config.first_player {
            FirstPlayer::Fixed(player) => player,
            FirstPlayer::Seeded => {
                if rng.gen::<bool>() {
                    Player::P1
                } else {
                    Player::P2
                }
            }
        };
        self.phase = GamePhase::InProgress;
        self.current = first;
        self.winner = None;
        info!(current_player = ?first, "game_setup_complete");
        Ok(first)
    }

    /// Fire at the current player's opponent on the specified coordinate.
    ///
    /// On success the turn passes to the other player, unless the shot sank the last
    /// ship, in which case the game is finished and `player` is the winner. Rejected
    /// moves change nothing.
    pub fn make_move(&mut self, player: Player, coord: Coordinate) -> Result<ShotOutcome, MoveError> {
        if self.phase != GamePhase::InProgress {
            debug!(?player, phase = ?self.phase, "move_rejected_game_not_in_progress");
            return Err(MoveError::NotInProgress { phase: self.phase });
        }
        if player != self.current {
            debug!(?player, current = ?self.current, "move_rejected_wrong_player");
            return Err(MoveError::WrongPlayer {
                expected: self.current,
                actual: player,
            });
        }

        let outcome = self.board_mut(player.opponent()).receive_shot(coord)?;
        debug!(?player, row = coord.row, col = coord.col, ?outcome, "move_made");

        if self.board(player.opponent()).all_ships_sunk() {
            self.phase = GamePhase::Finished;
            self.winner = Some(player);
            info!(winner = ?player, "game_finished");
        } else {
            self.current = player.opponent();
        }
        Ok(outcome)
    }

    /// Return all coordinates the player can legally target, in row-major order.
    pub fn valid_moves(&self, player: Player) -> Vec<Coordinate> {
        if self.phase != GamePhase::InProgress {
            return Vec::new();
        }
        let target = self.board(player.opponent());
        Coordinate::all()
            .filter(|&coord| !target.is_targeted(coord))
            .collect()
    }

    /// Omniscient snapshot of the whole game, for replay and telemetry.
    pub fn get_state(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase,
            current_player: self.current,
            winner: self.winner,
            player_one: BoardSnapshot::full(self.board(Player::P1)),
            player_two: BoardSnapshot::full(self.board(Player::P2)),
        }
    }

    /// The game as `player` may see it. The opponent's unsunk ships are left out.
    pub fn player_view(&self, player: Player) -> PlayerView {
        PlayerView {
            player,
            phase: self.phase,
            current_player: self.current,
            winner: self.winner,
            own: BoardSnapshot::full(self.board(player)),
            opponent: BoardSnapshot::redacted(self.board(player.opponent())),
        }
    }
}
