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

//! Configuration of the environment.
//!
//! Both structs deserialize with `#[serde(default)]`, so a partial JSON document only
//! needs to name the fields it overrides.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    board::PlacementRules,
    game::{FirstPlayer, GameConfig},
};

/// Default cap on the number of `step` calls in one episode.
pub const DEFAULT_MAX_STEPS: usize = 400;

/// Shaped reward magnitudes. Every value is overridable.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Agent shot hit a ship.
    pub hit: f64,
    /// Agent shot hit nothing.
    pub miss: f64,
    /// Added to `hit` when the shot sinks a ship.
    pub sunk_bonus: f64,
    /// Any rejected action.
    pub invalid: f64,
    /// Each successful placement by the agent.
    pub placement: f64,
    /// Added to `placement` for the last ship of the agent's fleet.
    pub placement_complete: f64,
    /// Added when the agent sinks the whole opposing fleet.
    pub win: f64,
    /// Added when the opponent sinks the agent's fleet.
    pub loss: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            hit: 0.1,
            miss: -0.01,
            sunk_bonus: 0.0,
            invalid: -0.1,
            placement: 0.01,
            placement_complete: 0.05,
            win: 1.0,
            loss: -1.0,
        }
    }
}

impl RewardConfig {
    fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("hit", self.hit),
            ("miss", self.miss),
            ("sunk_bonus", self.sunk_bonus),
            ("invalid", self.invalid),
            ("placement", self.placement),
            ("placement_complete", self.placement_complete),
            ("win", self.win),
            ("loss", self.loss),
        ]
    }
}

/// Options recognized by [`BattleshipEnv`][crate::env::BattleshipEnv].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// The agent places its own fleet through placement actions.
    pub allow_agent_placement: bool,
    /// The opponent places its fleet through its placement policy.
    pub allow_opponent_placement: bool,
    /// Episodes are truncated once this many steps have been taken.
    pub max_steps: usize,
    /// Seed of the episode RNG until a reset supplies one.
    pub seed: u64,
    pub first_player: FirstPlayer,
    pub rules: PlacementRules,
    pub rewards: RewardConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            allow_agent_placement: false,
            allow_opponent_placement: false,
            max_steps: DEFAULT_MAX_STEPS,
            seed: 0,
            first_player: FirstPlayer::default(),
            rules: PlacementRules::default(),
            rewards: RewardConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Check the configuration before any episode starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::ZeroMaxSteps);
        }
        if let Some(&(name, value)) = self
            .rewards
            .fields()
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ConfigError::NonFiniteReward { name, value });
        }
        Ok(())
    }

    /// Whether the action space contains placement actions.
    pub fn has_placement_actions(&self) -> bool {
        self.allow_agent_placement || self.allow_opponent_placement
    }

    /// Rules for the engine game of each episode.
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            rules: self.rules,
            first_player: self.first_player,
        }
    }
}

/// Configuration rejected before an episode began.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_steps must be at least 1")]
    ZeroMaxSteps,

    #[error("reward `{name}` must be finite, got {value}")]
    NonFiniteReward { name: &'static str, value: f64 },
}
