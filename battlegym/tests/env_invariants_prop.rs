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

//! Property tests over generated seeds and action sequences.
//!
//! Invariants covered:
//! - Replaying the same seed and actions reproduces every step exactly.
//! - Mask-legal actions never take the invalid path; mask-illegal ones always do.
//! - Ships never overlap and always lie on the board.
//! - The player to move only changes after an accepted, non-final shot.
use std::collections::HashSet;

use proptest::prelude::*;

use battlegym::{
    env::{BattleshipEnv, EnvConfig, Step},
    game::{FirstPlayer, MoveError},
    BattleshipGame, Board, Coordinate, GamePhase, Player,
};

fn config(agent_placement: bool, opponent_placement: bool) -> EnvConfig {
    EnvConfig {
        allow_agent_placement: agent_placement,
        allow_opponent_placement: opponent_placement,
        ..EnvConfig::default()
    }
}

/// Run `actions` from a fresh reset, stopping at the end of the episode.
fn rollout(config: EnvConfig, seed: u64, actions: &[usize]) -> Vec<Step> {
    let mut env = BattleshipEnv::new(config).unwrap();
    env.reset(Some(seed)).unwrap();
    let mut steps = Vec::new();
    for &action in actions {
        let step = env.step(action).unwrap();
        let done = step.terminated || step.truncated;
        steps.push(step);
        if done {
            break;
        }
    }
    steps
}

fn assert_valid_layout(board: &Board) {
    let mut seen = HashSet::new();
    for ship in board.ships() {
        assert_eq!(ship.coords().len(), ship.ship_type().len());
        for &coord in ship.coords() {
            assert!(coord.in_bounds(), "{} is off the board", coord);
            assert!(seen.insert(coord), "{} is occupied twice", coord);
        }
    }
}

proptest! {
    #[test]
    fn same_seed_and_actions_reproduce_episode(
        seed in any::<u64>(),
        agent_placement in any::<bool>(),
        opponent_placement in any::<bool>(),
        actions in prop::collection::vec(0usize..1200, 1..120),
    ) {
        let config = config(agent_placement, opponent_placement);
        let a = rollout(config, seed, &actions);
        let b = rollout(config, seed, &actions);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn mask_matches_invalid_path(
        seed in any::<u64>(),
        agent_placement in any::<bool>(),
        opponent_placement in any::<bool>(),
        seeded_first in any::<bool>(),
        picks in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..150),
    ) {
        let first_player = if seeded_first {
            FirstPlayer::Seeded
        } else {
            FirstPlayer::default()
        };
        let config = EnvConfig {
            first_player,
            ..config(agent_placement, opponent_placement)
        };
        let mut env = BattleshipEnv::new(config).unwrap();
        let reset = env.reset(Some(seed)).unwrap();
        let mut mask = reset.info.action_mask;
        for (pick_legal, index) in picks {
            let legal: Vec<usize> = mask.legal_actions().collect();
            let illegal: Vec<usize> = (0..mask.len()).filter(|&i| !mask.is_legal(i)).collect();
            let (action, expect_invalid) = if pick_legal && !legal.is_empty() {
                (*index.get(&legal), false)
            } else if !illegal.is_empty() {
                (*index.get(&illegal), true)
            } else {
                (*index.get(&legal), false)
            };
            let before = env.game().get_state();
            let step = env.step(action).unwrap();
            prop_assert_eq!(step.info.invalid_action, expect_invalid);
            if expect_invalid {
                prop_assert_eq!(env.game().get_state(), before);
            }
            for &player in Player::ALL {
                assert_valid_layout(env.game().board(player));
            }
            if step.terminated || step.truncated {
                prop_assert!(!step.info.action_mask.any());
                break;
            }
            mask = step.info.action_mask;
        }
    }

    #[test]
    fn turn_passes_only_after_accepted_shots(
        seed in any::<u64>(),
        shots in prop::collection::vec((0usize..12, 0usize..12), 1..300),
    ) {
        let mut game = BattleshipGame::new();
        game.setup_random(seed).unwrap();
        for &player in Player::ALL {
            assert_valid_layout(game.board(player));
        }
        for (row, col) in shots {
            if game.phase() == GamePhase::Finished {
                break;
            }
            let player = game.current_player();
            let coord = Coordinate::new(row, col);
            let before = game.get_state();
            match game.make_move(player, coord) {
                Ok(_) if game.phase() == GamePhase::Finished => {
                    prop_assert_eq!(game.winner(), Some(player));
                    prop_assert_eq!(game.current_player(), player);
                }
                Ok(_) => prop_assert_eq!(game.current_player(), player.opponent()),
                Err(err) => {
                    prop_assert!(matches!(
                        err,
                        MoveError::OutOfBounds(_) | MoveError::DuplicateShot(_)
                    ));
                    prop_assert_eq!(game.get_state(), before);
                }
            }
            // The other player may never move out of turn.
            if game.phase() == GamePhase::InProgress {
                let waiting = game.current_player().opponent();
                let is_wrong_player = matches!(
                    game.make_move(waiting, Coordinate::new(0, 0)),
                    Err(MoveError::WrongPlayer { .. })
                );
                prop_assert!(is_wrong_player);
            }
        }
    }
}
