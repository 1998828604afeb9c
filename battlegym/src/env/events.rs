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

//! Observation-only hooks into episode progress.
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    board::{Coordinate, ShotOutcome},
    env::{EpisodePhase, InvalidReason},
    game::Player,
    ships::{Orientation, ShipType},
};

/// Something that happened during an episode.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvEvent {
    /// A new episode began. `seed` is the seed passed to `reset`, if any.
    Reset { episode: u64, seed: Option<u64> },
    /// Both fleets are on the board and firing begins.
    SetupComplete { first_player: Player },
    /// A ship was placed through a placement action.
    ShipPlaced {
        player: Player,
        ship_type: ShipType,
        start: Coordinate,
        orientation: Orientation,
    },
    /// A shot landed.
    Shot {
        player: Player,
        coord: Coordinate,
        outcome: ShotOutcome,
    },
    /// An agent action was rejected.
    InvalidAction {
        action: usize,
        phase: EpisodePhase,
        reason: InvalidReason,
    },
    /// The episode ended.
    EpisodeComplete {
        winner: Option<Player>,
        truncated: bool,
        steps: usize,
        total_reward: f64,
    },
}

/// Receives [`EnvEvent`]s. Sinks cannot influence the environment.
///
/// Any `FnMut(&EnvEvent)` closure is a sink.
pub trait EventSink {
    fn on_event(&mut self, event: &EnvEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&EnvEvent),
{
    fn on_event(&mut self, event: &EnvEvent) {
        self(event)
    }
}

/// Collects events in memory. Clones share the same buffer, so a clone can be handed to
/// the environment and the original read afterwards.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<EnvEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EnvEvent>> {
        // A panic while pushing cannot leave the buffer half-written.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<EnvEvent> {
        self.lock().clone()
    }

    /// Remove and return every event recorded so far.
    pub fn drain(&self) -> Vec<EnvEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &EnvEvent) {
        self.lock().push(event.clone());
    }
}
