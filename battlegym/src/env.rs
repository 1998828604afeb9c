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

//! Single-agent environment around a [`BattleshipGame`].
//!
//! The agent always plays [`Player::P1`]. The environment plays [`Player::P2`] through an
//! [`OpponentPolicy`] and absorbs its turns, so callers only ever submit the agent's
//! actions through [`BattleshipEnv::step`]. Rule violations never surface as errors:
//! they become steps with the `invalid` reward and leave the game untouched. If the
//! environment itself cannot finish setting up a game, the call fails with
//! [`EnvError::Setup`] and the environment must be reset again.
//!
//! All randomness comes from one [`ChaCha8Rng`] per environment. Given the same seed,
//! policies and actions, every observation and reward is reproduced exactly.
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    board::{CannotPlaceReason, Coordinate, ShotOutcome, BOARD_SIZE},
    game::{BattleshipGame, GamePhase, MoveError, Player, PlayerView, SetupError},
    ships::{Orientation, ShipType},
};

pub use self::{
    action::{Action, ActionMask, ActionSpace, PLACEMENT_PER_SHIP},
    config::{ConfigError, EnvConfig, RewardConfig, DEFAULT_MAX_STEPS},
    events::{EnvEvent, EventLog, EventSink},
    observation::{num_channels, Observation, BASE_CHANNELS},
    policy::{random_legal, OpponentPolicy, RandomPolicy},
};

use self::observation::PlacementPlanes;

mod action;
mod config;
mod events;
pub mod observation;
mod policy;

/// Placement attempts granted to the opponent's policy before its remaining ships are
/// placed at random.
pub const MAX_OPPONENT_PLACEMENT_ATTEMPTS: usize = 5000;

type BoxedPolicy = Box<dyn OpponentPolicy + Send>;

/// Episode-level phase. Placement only occurs with agent placement enabled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodePhase {
    Placement,
    Firing,
}

/// Bounded vocabulary describing where a step's reward came from.
///
/// The base tags are `hit`, `miss`, `win`, `loss`, `invalid` and `placement_complete`.
/// `placement` extends that set: it tags an accepted placement that leaves ships still
/// pending, paid at the `placement` reward. Only episodes with agent placement enabled
/// report it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Hit,
    Miss,
    Win,
    Loss,
    Invalid,
    /// An accepted placement with more ships still to place.
    Placement,
    /// The placement that completed the agent's fleet.
    PlacementComplete,
}

impl RewardType {
    /// Every tag, base tags first.
    pub const ALL: &'static [RewardType] = &[
        RewardType::Hit,
        RewardType::Miss,
        RewardType::Win,
        RewardType::Loss,
        RewardType::Invalid,
        RewardType::PlacementComplete,
        RewardType::Placement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RewardType::Hit => "hit",
            RewardType::Miss => "miss",
            RewardType::Win => "win",
            RewardType::Loss => "loss",
            RewardType::Invalid => "invalid",
            RewardType::Placement => "placement",
            RewardType::PlacementComplete => "placement_complete",
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an agent action took the invalid path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvalidReason {
    /// The index is not part of the action space.
    OutOfRange,
    /// A placement during firing, or a shot during placement.
    WrongPhase,
    /// The ship was already placed this episode.
    ShipNotPending,
    /// The engine rejected the placement.
    Placement(CannotPlaceReason),
    /// The engine rejected the shot.
    Move(MoveError),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidReason::OutOfRange => f.write_str("action index out of range"),
            InvalidReason::WrongPhase => f.write_str("action not allowed in this phase"),
            InvalidReason::ShipNotPending => f.write_str("ship already placed"),
            InvalidReason::Placement(reason) => fmt::Display::fmt(reason, f),
            InvalidReason::Move(err) => fmt::Display::fmt(err, f),
        }
    }
}

/// Misuse of the environment by the caller, or a game the environment could not set up.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum EnvError {
    #[error("the environment must be reset before stepping")]
    NotReset,
    #[error("the episode is over; call reset to start a new one")]
    EpisodeOver,
    /// Fleets could not be completed or the game could not start. The episode is
    /// abandoned.
    #[error("could not set up the game: {0}")]
    Setup(#[from] SetupError),
    /// The engine rejected a shot the opponent chose from its own mask.
    #[error("the opponent's shot was rejected: {0}")]
    OpponentMove(MoveError),
}

/// Why an agent action did not produce a transition.
enum StepError {
    Invalid(InvalidReason),
    Env(EnvError),
}

impl From<EnvError> for StepError {
    fn from(err: EnvError) -> Self {
        StepError::Env(err)
    }
}

/// Metadata returned by [`BattleshipEnv::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResetInfo {
    pub action_mask: ActionMask,
    pub phase: EpisodePhase,
    /// Opening shot by the opponent when it moves first.
    pub opponent_shot: Option<(Coordinate, ShotOutcome)>,
    pub state: PlayerView,
}

/// Result of [`BattleshipEnv::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reset {
    pub observation: Observation,
    pub info: ResetInfo,
}

/// Metadata returned by [`BattleshipEnv::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub action_mask: ActionMask,
    pub reward_type: RewardType,
    pub phase: EpisodePhase,
    pub invalid_action: bool,
    pub winner: Option<Player>,
    pub step_count: usize,
    /// Result of the agent's shot, if it fired.
    pub shot: Option<ShotOutcome>,
    /// The opponent's reply during this step, if any.
    pub opponent_shot: Option<(Coordinate, ShotOutcome)>,
}

/// Result of [`BattleshipEnv::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Effects of one accepted agent action.
struct Transition {
    reward: f64,
    reward_type: RewardType,
    shot: Option<ShotOutcome>,
    opponent_shot: Option<(Coordinate, ShotOutcome)>,
}

/// Gym-style Battleship environment.
pub struct BattleshipEnv {
    config: EnvConfig,
    space: ActionSpace,
    channels: usize,

    opponent_policy: BoxedPolicy,
    placement_policy: Option<BoxedPolicy>,
    sink: Option<Box<dyn EventSink + Send>>,

    rng: ChaCha8Rng,
    episode: u64,
    game: BattleshipGame,
    phase: EpisodePhase,
    step_count: usize,
    last_agent_shot: Option<Coordinate>,
    last_opponent_shot: Option<Coordinate>,
    total_reward: f64,
    started: bool,
    done: bool,
}

impl fmt::Debug for BattleshipEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BattleshipEnv")
            .field("config", &self.config)
            .field("episode", &self.episode)
            .field("phase", &self.phase)
            .field("step_count", &self.step_count)
            .field("done", &self.done)
            .finish()
    }
}

impl BattleshipEnv {
    /// Build an environment. The episode RNG is seeded from `config.seed` until a reset
    /// supplies a seed.
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            space: ActionSpace::new(config.has_placement_actions()),
            channels: num_channels(config.allow_agent_placement),
            opponent_policy: Box::new(RandomPolicy),
            placement_policy: None,
            sink: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            episode: 0,
            game: BattleshipGame::with_config(config.game_config()),
            phase: EpisodePhase::Firing,
            step_count: 0,
            last_agent_shot: None,
            last_opponent_shot: None,
            total_reward: 0.0,
            started: false,
            done: false,
            config,
        })
    }

    /// Use `policy` to choose the opponent's shots.
    pub fn with_opponent_policy<P: OpponentPolicy + Send + 'static>(mut self, policy: P) -> Self {
        self.opponent_policy = Box::new(policy);
        self
    }

    /// Use `policy` to choose the opponent's placements when opponent placement is enabled.
    /// Without one, the opponent policy is asked.
    pub fn with_placement_policy<P: OpponentPolicy + Send + 'static>(mut self, policy: P) -> Self {
        self.placement_policy = Some(Box::new(policy));
        self
    }

    /// Deliver [`EnvEvent`]s to `sink`.
    pub fn with_sink<S: EventSink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn action_space(&self) -> ActionSpace {
        self.space
    }

    pub fn num_channels(&self) -> usize {
        self.channels
    }

    pub fn observation_shape(&self) -> (usize, usize, usize) {
        (self.channels, BOARD_SIZE, BOARD_SIZE)
    }

    pub fn episode_phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Number of `step` calls this episode, including invalid ones.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Sum of the rewards of this episode.
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Whether the current episode has terminated or been truncated.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The underlying game.
    pub fn game(&self) -> &BattleshipGame {
        &self.game
    }

    /// The game as the agent sees it.
    pub fn player_view(&self) -> PlayerView {
        self.game.player_view(Player::P1)
    }

    /// Start a new episode.
    ///
    /// With a seed the episode RNG is reseeded; without one the RNG stream continues, so
    /// the first seedless reset uses `config.seed`. On error the environment stays
    /// un-reset: stepping returns [`EnvError::NotReset`] and the mask is empty.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Reset, EnvError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.episode += 1;
        self.game = BattleshipGame::with_config(self.config.game_config());
        self.step_count = 0;
        self.last_agent_shot = None;
        self.last_opponent_shot = None;
        self.total_reward = 0.0;
        self.started = false;
        self.done = false;
        self.emit(EnvEvent::Reset {
            episode: self.episode,
            seed,
        });

        self.phase = EpisodePhase::Placement;
        let opponent_shot = if self.config.allow_agent_placement {
            None
        } else {
            let started = self
                .fill_fleet(Player::P1)
                .map_err(EnvError::from)
                .and_then(|()| self.begin_firing());
            match started {
                Ok(shot) => shot,
                Err(err) => {
                    error!(%err, episode = self.episode, "env_reset_failed");
                    return Err(err);
                }
            }
        };
        self.started = true;

        info!(
            episode = self.episode,
            ?seed,
            phase = ?self.phase,
            allow_agent_placement = self.config.allow_agent_placement,
            allow_opponent_placement = self.config.allow_opponent_placement,
            "env_reset"
        );

        Ok(Reset {
            observation: self.observation(),
            info: ResetInfo {
                action_mask: self.action_mask(),
                phase: self.phase,
                opponent_shot,
                state: self.player_view(),
            },
        })
    }

    /// Apply one agent action. Rule violations produce the invalid reward. Calls outside a
    /// live episode are errors, as is a game that cannot be set up once the agent's fleet
    /// is complete; the latter abandons the episode.
    pub fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        if !self.started {
            return Err(EnvError::NotReset);
        }
        if self.done {
            return Err(EnvError::EpisodeOver);
        }
        self.step_count += 1;

        let phase = self.phase;
        let (transition, invalid_action) = match self.apply(action) {
            Ok(transition) => (transition, false),
            Err(StepError::Env(err)) => {
                error!(%err, episode = self.episode, "env_step_failed");
                self.started = false;
                return Err(err);
            }
            Err(StepError::Invalid(reason)) => {
                warn!(action, ?phase, %reason, "invalid_action");
                self.emit(EnvEvent::InvalidAction {
                    action,
                    phase,
                    reason,
                });
                let transition = Transition {
                    reward: self.config.rewards.invalid,
                    reward_type: RewardType::Invalid,
                    shot: None,
                    opponent_shot: None,
                };
                (transition, true)
            }
        };

        let terminated = self.game.phase() == GamePhase::Finished;
        let truncated = !terminated && self.step_count >= self.config.max_steps;
        self.total_reward += transition.reward;
        self.done = terminated || truncated;
        if self.done {
            info!(
                winner = ?self.game.winner(),
                truncated,
                steps = self.step_count,
                total_reward = self.total_reward,
                "episode_complete"
            );
            self.emit(EnvEvent::EpisodeComplete {
                winner: self.game.winner(),
                truncated,
                steps: self.step_count,
                total_reward: self.total_reward,
            });
        }

        Ok(Step {
            observation: self.observation(),
            reward: transition.reward,
            terminated,
            truncated,
            info: StepInfo {
                action_mask: self.action_mask(),
                reward_type: transition.reward_type,
                phase: self.phase,
                invalid_action,
                winner: self.game.winner(),
                step_count: self.step_count,
                shot: transition.shot,
                opponent_shot: transition.opponent_shot,
            },
        })
    }

    /// Legality of every action for the agent. Nothing is legal outside a live episode.
    pub fn action_mask(&self) -> ActionMask {
        if !self.started || self.done {
            return ActionMask::none(self.space.size());
        }
        match self.phase {
            EpisodePhase::Placement => self.placement_mask(Player::P1),
            EpisodePhase::Firing => self.shot_mask(Player::P1),
        }
    }

    /// The agent's current observation.
    pub fn observation(&self) -> Observation {
        self.observe(Player::P1)
    }

    fn apply(&mut self, action: usize) -> Result<Transition, StepError> {
        match (self.phase, self.space.decode(action)) {
            (_, None) => Err(StepError::Invalid(InvalidReason::OutOfRange)),
            (
                EpisodePhase::Placement,
                Some(Action::Place {
                    ship_type,
                    start,
                    orientation,
                }),
            ) => self.agent_place(ship_type, start, orientation),
            (EpisodePhase::Firing, Some(Action::Fire(coord))) => self.agent_fire(coord),
            _ => Err(StepError::Invalid(InvalidReason::WrongPhase)),
        }
    }

    fn agent_place(
        &mut self,
        ship_type: ShipType,
        start: Coordinate,
        orientation: Orientation,
    ) -> Result<Transition, StepError> {
        if !self.game.board(Player::P1).pending().contains(ship_type) {
            return Err(StepError::Invalid(InvalidReason::ShipNotPending));
        }
        self.game
            .place_ship(Player::P1, ship_type, start, orientation)
            .map_err(|err| {
                StepError::Invalid(match err {
                    SetupError::Placement(err) => InvalidReason::Placement(err.reason()),
                    _ => InvalidReason::WrongPhase,
                })
            })?;
        self.emit(EnvEvent::ShipPlaced {
            player: Player::P1,
            ship_type,
            start,
            orientation,
        });

        let rewards = self.config.rewards;
        if self.game.board(Player::P1).is_fleet_complete() {
            info!(actor = "agent", "player_placement_complete");
            let opponent_shot = self.begin_firing()?;
            Ok(Transition {
                reward: rewards.placement + rewards.placement_complete,
                reward_type: RewardType::PlacementComplete,
                shot: None,
                opponent_shot,
            })
        } else {
            Ok(Transition {
                reward: rewards.placement,
                reward_type: RewardType::Placement,
                shot: None,
                opponent_shot: None,
            })
        }
    }

    fn agent_fire(&mut self, coord: Coordinate) -> Result<Transition, StepError> {
        let shot = self
            .game
            .make_move(Player::P1, coord)
            .map_err(|err| StepError::Invalid(InvalidReason::Move(err)))?;
        self.last_agent_shot = Some(coord);
        self.emit(EnvEvent::Shot {
            player: Player::P1,
            coord,
            outcome: shot,
        });

        let rewards = self.config.rewards;
        let (mut reward, mut reward_type) = if shot.is_hit() {
            (rewards.hit, RewardType::Hit)
        } else {
            (rewards.miss, RewardType::Miss)
        };
        if shot.sunk() {
            reward += rewards.sunk_bonus;
        }

        let opponent_shot = if self.game.phase() == GamePhase::InProgress {
            self.opponent_turn()?
        } else {
            None
        };

        match self.game.winner() {
            Some(Player::P1) => {
                reward += rewards.win;
                reward_type = RewardType::Win;
            }
            Some(Player::P2) => {
                reward += rewards.loss;
                reward_type = RewardType::Loss;
            }
            None => {}
        }
        Ok(Transition {
            reward,
            reward_type,
            shot: Some(shot),
            opponent_shot,
        })
    }

    /// Set up the opponent's fleet, start the game and, if the opponent moves first, play
    /// its opening shot.
    fn begin_firing(&mut self) -> Result<Option<(Coordinate, ShotOutcome)>, EnvError> {
        if self.config.allow_opponent_placement {
            self.opponent_placement()?;
        } else {
            self.fill_fleet(Player::P2)?;
        }

        let first = self.game.start(&mut self.rng)?;
        self.phase = EpisodePhase::Firing;
        info!(phase = ?self.phase, first_player = ?first, "env_phase_transition");
        self.emit(EnvEvent::SetupComplete {
            first_player: first,
        });

        if first == Player::P2 {
            self.opponent_turn()
        } else {
            Ok(None)
        }
    }

    /// Randomly place the rest of `player`'s fleet. If the ships already down leave no
    /// room, the whole fleet is placed again from an empty board.
    fn fill_fleet(&mut self, player: Player) -> Result<(), SetupError> {
        match self.game.randomize_remaining(player, &mut self.rng) {
            Err(SetupError::Placement(err))
                if err.reason() == CannotPlaceReason::InsufficientSpace =>
            {
                warn!(?player, %err, "fleet_replaced_no_room");
                for &ship in ShipType::ALL {
                    self.game.unplace_ship(player, ship)?;
                }
                self.game.randomize_remaining(player, &mut self.rng)
            }
            result => result,
        }
    }

    /// Let the placement policy (or the opponent policy) place the opponent's fleet.
    fn opponent_placement(&mut self) -> Result<(), SetupError> {
        let mut attempts = 0;
        while !self.game.board(Player::P2).is_fleet_complete()
            && attempts < MAX_OPPONENT_PLACEMENT_ATTEMPTS
        {
            attempts += 1;
            let mask = self.placement_mask(Player::P2);
            if !mask.any() {
                break;
            }
            let obs = self.observe(Player::P2);
            let policy = match self.placement_policy.as_mut() {
                Some(policy) => policy,
                None => &mut self.opponent_policy,
            };
            let choice = (**policy).choose_action(&obs, &mask, &mut self.rng);
            let index = if mask.is_legal(choice) {
                choice
            } else {
                debug!(choice, "opponent_placement_illegal_choice");
                match random_legal(&mask, &mut self.rng) {
                    Some(index) => index,
                    None => break,
                }
            };
            if let Some(Action::Place {
                ship_type,
                start,
                orientation,
            }) = self.space.decode(index)
            {
                if self
                    .game
                    .place_ship(Player::P2, ship_type, start, orientation)
                    .is_ok()
                {
                    self.emit(EnvEvent::ShipPlaced {
                        player: Player::P2,
                        ship_type,
                        start,
                        orientation,
                    });
                }
            }
        }

        let remaining = self.game.board(Player::P2).pending();
        if !remaining.is_empty() {
            warn!(
                remaining = remaining.bits().count_ones(),
                attempts,
                actor = "opponent",
                "opponent_manual_placement_fallback"
            );
            self.fill_fleet(Player::P2)?;
        }
        info!(attempts, actor = "opponent", "opponent_manual_placement_complete");
        Ok(())
    }

    /// Ask the opponent policy for one shot and apply it.
    fn opponent_turn(&mut self) -> Result<Option<(Coordinate, ShotOutcome)>, EnvError> {
        let mask = self.shot_mask(Player::P2);
        let obs = self.observe(Player::P2);
        let choice = (*self.opponent_policy).choose_action(&obs, &mask, &mut self.rng);
        let index = if mask.is_legal(choice) {
            choice
        } else {
            warn!(choice, "opponent_action_illegal_fallback");
            match random_legal(&mask, &mut self.rng) {
                Some(index) => index,
                None => return Ok(None),
            }
        };

        let coord = Coordinate::from_index(index);
        match self.game.make_move(Player::P2, coord) {
            Ok(outcome) => {
                self.last_opponent_shot = Some(coord);
                self.emit(EnvEvent::Shot {
                    player: Player::P2,
                    coord,
                    outcome,
                });
                Ok(Some((coord, outcome)))
            }
            Err(err) => Err(EnvError::OpponentMove(err)),
        }
    }

    /// Firing indices at cells `player` has not targeted yet, while it is their turn.
    fn shot_mask(&self, player: Player) -> ActionMask {
        let mut mask = ActionMask::none(self.space.size());
        if self.game.phase() == GamePhase::InProgress && self.game.current_player() == player {
            for coord in self.game.valid_moves(player) {
                if let Some(index) = coord.to_index() {
                    mask.allow(index);
                }
            }
        }
        mask
    }

    /// Placement indices for every pending ship of `player` that would be accepted.
    fn placement_mask(&self, player: Player) -> ActionMask {
        let mut mask = ActionMask::none(self.space.size());
        if self.game.phase() != GamePhase::Setup {
            return mask;
        }
        let board = self.game.board(player);
        for ship_type in ShipType::iter_set(board.pending()) {
            for (orientation, start) in board.legal_placements(ship_type) {
                let action = Action::Place {
                    ship_type,
                    start,
                    orientation,
                };
                if let Some(index) = self.space.encode(&action) {
                    mask.allow(index);
                }
            }
        }
        mask
    }

    fn observe(&self, player: Player) -> Observation {
        let last_enemy_shot = match player {
            Player::P1 => self.last_opponent_shot,
            Player::P2 => self.last_agent_shot,
        };
        let placement = if self.config.allow_agent_placement {
            Some(PlacementPlanes {
                pending: self.game.board(player).pending(),
                active: self.game.phase() == GamePhase::Setup
                    && (player == Player::P2 || self.phase == EpisodePhase::Placement),
            })
        } else {
            None
        };
        observation::encode(
            &self.game,
            player,
            last_enemy_shot,
            self.step_count,
            placement,
        )
    }

    fn emit(&mut self, event: EnvEvent) {
        if let Some(sink) = self.sink.as_mut() {
            (**sink).on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests;
