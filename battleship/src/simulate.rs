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

//! Random-agent rollouts through [`BattleshipEnv`].
use std::{fmt, fs::File, io::BufReader, time::Instant};

use anyhow::{Context, Result};
use clap::ArgMatches;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use battlegym::{
    env::{random_legal, BattleshipEnv, EnvConfig, EnvEvent, Step},
    Player,
};

use crate::parse_arg;

pub fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let episodes: u64 = parse_arg(matches, "episodes")?.unwrap_or(100);
    let seed = config.seed;

    let mut env = BattleshipEnv::new(config)
        .context("invalid environment configuration")?
        .with_sink(|event: &EnvEvent| trace!(?event, "env_event"));
    let mut agent_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut stats = RolloutStats::new();

    info!(episodes, seed, "simulation_start");
    for episode in 0..episodes {
        // Only the first reset is seeded; later episodes continue the same stream.
        let reset = env.reset(if episode == 0 { Some(seed) } else { None })?;
        let mut mask = reset.info.action_mask;
        loop {
            let action = match random_legal(&mask, &mut agent_rng) {
                Some(action) => action,
                None => break,
            };
            let step = env.step(action)?;
            stats.on_step(&step);
            if step.terminated || step.truncated {
                debug!(
                    episode,
                    steps = step.info.step_count,
                    reward = env.total_reward(),
                    winner = ?step.info.winner,
                    "simulated_episode"
                );
                stats.on_episode_end(&step, env.total_reward());
                break;
            }
            mask = step.info.action_mask;
        }
    }

    println!("{}", stats);
    Ok(())
}

/// Read the optional JSON config file and apply command line overrides on top.
fn load_config(matches: &ArgMatches) -> Result<EnvConfig> {
    let mut config = match matches.value_of("config") {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("cannot parse environment config {}", path))?
        }
        None => EnvConfig::default(),
    };
    if matches.is_present("agent_placement") {
        config.allow_agent_placement = true;
    }
    if matches.is_present("opponent_placement") {
        config.allow_opponent_placement = true;
    }
    if let Some(max_steps) = parse_arg(matches, "max_steps")? {
        config.max_steps = max_steps;
    }
    if let Some(seed) = parse_arg(matches, "seed")? {
        config.seed = seed;
    }
    Ok(config)
}

/// Aggregate results over many episodes.
#[derive(Clone, Debug)]
pub struct RolloutStats {
    pub episodes: u64,
    pub wins: u64,
    pub losses: u64,
    pub truncations: u64,
    pub steps: u64,
    pub invalid_steps: u64,
    pub hits: u64,
    pub total_reward: f64,
    pub episode_len_max: u64,
    t0: Instant,
}

impl RolloutStats {
    pub fn new() -> Self {
        Self {
            episodes: 0,
            wins: 0,
            losses: 0,
            truncations: 0,
            steps: 0,
            invalid_steps: 0,
            hits: 0,
            total_reward: 0.0,
            episode_len_max: 0,
            t0: Instant::now(),
        }
    }

    pub fn on_step(&mut self, step: &Step) {
        self.steps += 1;
        if step.info.invalid_action {
            self.invalid_steps += 1;
        }
        if step.info.shot.map_or(false, |shot| shot.is_hit()) {
            self.hits += 1;
        }
    }

    /// Record the final step of an episode along with its cumulative reward.
    pub fn on_episode_end(&mut self, last: &Step, episode_reward: f64) {
        self.episodes += 1;
        self.total_reward += episode_reward;
        self.episode_len_max = self.episode_len_max.max(last.info.step_count as u64);
        match last.info.winner {
            Some(Player::P1) => self.wins += 1,
            Some(Player::P2) => self.losses += 1,
            None if last.truncated => self.truncations += 1,
            None => {}
        }
    }

    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.episodes)
    }

    pub fn avg_reward(&self) -> f64 {
        if self.episodes > 0 {
            self.total_reward / self.episodes as f64
        } else {
            0.0
        }
    }

    pub fn avg_ep_len(&self) -> f64 {
        ratio(self.steps, self.episodes)
    }

    pub fn steps_per_sec(&self) -> f64 {
        let dt = self.t0.elapsed().as_secs_f64();
        if dt > 0.0 {
            self.steps as f64 / dt
        } else {
            0.0
        }
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

impl fmt::Display for RolloutStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "episodes={} wins={} losses={} truncated={} win_rate={:.3} avg_reward={:.3} avg_ep_len={:.1} max_ep_len={} hits={} invalid={} sps={:.1}",
            self.episodes,
            self.wins,
            self.losses,
            self.truncations,
            self.win_rate(),
            self.avg_reward(),
            self.avg_ep_len(),
            self.episode_len_max,
            self.hits,
            self.invalid_steps,
            self.steps_per_sec(),
        )
    }
}
