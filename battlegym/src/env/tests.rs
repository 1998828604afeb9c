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
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::*;
use crate::{
    board::PlacementRules,
    env::observation::{LAST_ENEMY_SHOT, OWN_SHIPS, PLACEMENT_PHASE},
    game::FirstPlayer,
};

fn env(config: EnvConfig) -> BattleshipEnv {
    BattleshipEnv::new(config).unwrap()
}

fn placement_config() -> EnvConfig {
    EnvConfig {
        allow_agent_placement: true,
        ..EnvConfig::default()
    }
}

fn first_legal(mask: &ActionMask) -> usize {
    mask.legal_actions().next().unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Indices of the cells occupied by `player`'s ships.
fn ship_cells(env: &BattleshipEnv, player: Player) -> Vec<usize> {
    let mut cells: Vec<usize> = env
        .game()
        .board(player)
        .ships()
        .iter()
        .flat_map(|ship| ship.coords().to_vec())
        .filter_map(|coord| coord.to_index())
        .collect();
    cells.sort();
    cells
}

#[test]
fn step_before_reset_is_an_error() {
    let mut env = env(EnvConfig::default());
    assert_eq!(env.step(0), Err(EnvError::NotReset));
    assert!(!env.action_mask().any());
}

#[test]
fn reset_starts_in_firing_phase() {
    let mut env = env(EnvConfig::default());
    let reset = env.reset(Some(1)).unwrap();
    assert_eq!(reset.info.phase, EpisodePhase::Firing);
    assert_eq!(reset.info.action_mask.len(), 100);
    assert_eq!(reset.info.action_mask.count_legal(), 100);
    assert_eq!(reset.info.opponent_shot, None);
    assert_eq!(reset.observation.shape(), (6, 10, 10));
    assert_eq!(env.observation_shape(), (6, 10, 10));
    assert_eq!(reset.observation.plane(OWN_SHIPS).unwrap().iter().sum::<f32>(), 17.0);
    assert_eq!(reset.info.state.own.ships.len(), 5);
    assert!(reset.info.state.opponent.ships.is_empty());
    assert_eq!(env.game().phase(), GamePhase::InProgress);
}

#[test]
fn seedless_reset_uses_config_seed_first() {
    let mut a = env(EnvConfig {
        seed: 9,
        ..EnvConfig::default()
    });
    let mut b = env(EnvConfig::default());
    assert_eq!(a.reset(None).unwrap(), b.reset(Some(9)).unwrap());
    assert_eq!(a.game().get_state(), b.game().get_state());

    // Later seedless resets continue the stream instead of repeating it.
    let first = a.game().get_state();
    a.reset(None).unwrap();
    assert_ne!(a.game().get_state(), first);
}

#[test]
fn same_seed_same_episode() {
    let mut a = env(EnvConfig::default());
    let mut b = env(EnvConfig::default());
    assert_eq!(a.reset(Some(5)).unwrap(), b.reset(Some(5)).unwrap());
    loop {
        let action = first_legal(&a.action_mask());
        let step = a.step(action).unwrap();
        assert_eq!(step, b.step(action).unwrap());
        if step.terminated || step.truncated {
            break;
        }
    }
}

#[test]
fn out_of_range_action_is_invalid() {
    let mut env = env(EnvConfig::default());
    env.reset(Some(3)).unwrap();
    let before = env.game().get_state();
    let step = env.step(100).unwrap();
    assert!(approx(step.reward, -0.1));
    assert!(step.info.invalid_action);
    assert_eq!(step.info.reward_type, RewardType::Invalid);
    assert!(!step.terminated);
    assert!(!step.truncated);
    assert_eq!(step.info.step_count, 1);
    assert_eq!(env.game().get_state(), before);
}

#[test]
fn duplicate_shot_is_invalid() {
    let log = EventLog::new();
    let mut env = env(EnvConfig::default()).with_sink(log.clone());
    env.reset(Some(3)).unwrap();
    let first = env.step(0).unwrap();
    assert!(!first.info.invalid_action);
    assert!(first.info.shot.is_some());
    assert!(first.info.opponent_shot.is_some());
    assert!(!first.info.action_mask.is_legal(0));

    let before = env.game().get_state();
    let second = env.step(0).unwrap();
    assert!(second.info.invalid_action);
    assert_eq!(second.info.opponent_shot, None);
    assert_eq!(env.game().get_state(), before);
    assert!(log.events().contains(&EnvEvent::InvalidAction {
        action: 0,
        phase: EpisodePhase::Firing,
        reason: InvalidReason::Move(MoveError::DuplicateShot(Coordinate::new(0, 0))),
    }));
}

#[test]
fn truncates_at_max_steps() {
    let mut env = env(EnvConfig {
        max_steps: 3,
        ..EnvConfig::default()
    });
    env.reset(Some(2)).unwrap();
    for _ in 0..2 {
        let step = env.step(999).unwrap();
        assert!(!step.truncated);
    }
    let step = env.step(999).unwrap();
    assert!(step.truncated);
    assert!(!step.terminated);
    assert!(step.info.invalid_action);
    assert!(!step.info.action_mask.any());
    assert_eq!(env.step(0), Err(EnvError::EpisodeOver));
}

#[test]
fn sinking_the_fleet_wins() {
    let log = EventLog::new();
    let mut env = env(EnvConfig::default()).with_sink(log.clone());
    env.reset(Some(11)).unwrap();
    let targets = ship_cells(&env, Player::P2);
    let (&last, rest) = targets.split_last().unwrap();
    for &target in rest {
        let step = env.step(target).unwrap();
        assert!(step.info.shot.unwrap().is_hit());
        assert!(!step.terminated);
        assert!(step.reward >= 0.1 - 1e-9);
    }
    let step = env.step(last).unwrap();
    assert!(step.terminated);
    assert_eq!(step.info.reward_type, RewardType::Win);
    assert_eq!(step.info.winner, Some(Player::P1));
    assert!(approx(step.reward, 1.1));
    assert_eq!(step.info.opponent_shot, None);
    assert!(!step.info.action_mask.any());
    assert_eq!(env.step(0), Err(EnvError::EpisodeOver));

    match log.events().last() {
        Some(EnvEvent::EpisodeComplete {
            winner, truncated, ..
        }) => {
            assert_eq!(*winner, Some(Player::P1));
            assert!(!truncated);
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[test]
fn losing_the_fleet_loses() {
    let targets: Arc<Mutex<Vec<usize>>> = Arc::default();
    let policy_targets = targets.clone();
    let mut env = env(EnvConfig::default()).with_opponent_policy(
        move |_: &Observation, mask: &ActionMask| {
            let targets = policy_targets.lock().unwrap();
            targets
                .iter()
                .copied()
                .find(|&t| mask.is_legal(t))
                .unwrap_or(0)
        },
    );
    env.reset(Some(4)).unwrap();
    *targets.lock().unwrap() = ship_cells(&env, Player::P1);

    let occupied = ship_cells(&env, Player::P2);
    let mut misses = (0..100).filter(|i| !occupied.contains(i));
    let mut last = None;
    for _ in 0..17 {
        let step = env.step(misses.next().unwrap()).unwrap();
        assert_eq!(step.info.shot, Some(ShotOutcome::Miss));
        last = Some(step);
    }
    let step = last.unwrap();
    assert!(step.terminated);
    assert_eq!(step.info.reward_type, RewardType::Loss);
    assert_eq!(step.info.winner, Some(Player::P2));
    assert!(approx(step.reward, -1.01));
}

#[test]
fn custom_opponent_policy_is_consulted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut env = env(EnvConfig::default()).with_opponent_policy(
        move |_: &Observation, mask: &ActionMask| {
            counter.fetch_add(1, Ordering::SeqCst);
            first_legal(mask)
        },
    );
    env.reset(Some(8)).unwrap();
    for n in 0..3 {
        let step = env.step(n).unwrap();
        let (coord, _) = step.info.opponent_shot.unwrap();
        assert_eq!(coord, Coordinate::from_index(n));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn illegal_opponent_choice_falls_back_to_legal_shot() {
    let mut env = env(EnvConfig::default())
        .with_opponent_policy(|_: &Observation, _: &ActionMask| 12_345);
    env.reset(Some(8)).unwrap();
    for n in 0..10 {
        let step = env.step(n).unwrap();
        assert!(step.info.opponent_shot.is_some());
    }
    assert_eq!(env.game().board(Player::P1).shot_count(), 10);
}

#[test]
fn opponent_can_move_first() {
    let mut env = env(EnvConfig {
        first_player: FirstPlayer::Fixed(Player::P2),
        ..EnvConfig::default()
    });
    let reset = env.reset(Some(6)).unwrap();
    let (coord, _) = reset.info.opponent_shot.unwrap();
    assert_eq!(env.game().board(Player::P1).shot_count(), 1);
    assert_eq!(env.game().current_player(), Player::P1);
    assert_eq!(reset.observation.get(LAST_ENEMY_SHOT, coord), 1.0);
    assert_eq!(reset.info.action_mask.count_legal(), 100);
}

#[test]
fn agent_placement_flow() {
    let log = EventLog::new();
    let mut env = env(placement_config()).with_sink(log.clone());
    assert_eq!(env.action_space().size(), 1100);
    assert_eq!(env.num_channels(), 12);

    let reset = env.reset(Some(21)).unwrap();
    assert_eq!(reset.info.phase, EpisodePhase::Placement);
    assert_eq!(env.game().phase(), GamePhase::Setup);
    let mask = &reset.info.action_mask;
    assert!((0..100).all(|i| !mask.is_legal(i)));
    // 120 + 140 + 160 + 160 + 180 starts on an empty board.
    assert_eq!(mask.count_legal(), 760);
    assert!(reset.observation.plane(PLACEMENT_PHASE).unwrap().iter().all(|&v| v == 1.0));

    // Firing during placement is rejected.
    let step = env.step(0).unwrap();
    assert!(step.info.invalid_action);
    assert_eq!(step.info.phase, EpisodePhase::Placement);

    for n in 0..ShipType::ALL.len() {
        let step = env.step(first_legal(&env.action_mask())).unwrap();
        assert!(!step.info.invalid_action);
        if n + 1 < ShipType::ALL.len() {
            assert_eq!(step.info.reward_type, RewardType::Placement);
            assert!(approx(step.reward, 0.01));
            assert_eq!(step.info.phase, EpisodePhase::Placement);
            assert!((0..100).all(|i| !step.info.action_mask.is_legal(i)));
        } else {
            assert_eq!(step.info.reward_type, RewardType::PlacementComplete);
            assert!(approx(step.reward, 0.06));
            assert_eq!(step.info.phase, EpisodePhase::Firing);
            assert_eq!(step.info.action_mask.count_legal(), 100);
            assert!((100..1100).all(|i| !step.info.action_mask.is_legal(i)));
            assert!(step.observation.plane(PLACEMENT_PHASE).unwrap().iter().all(|&v| v == 0.0));
        }
    }
    assert_eq!(env.game().phase(), GamePhase::InProgress);
    assert!(env.game().board(Player::P2).is_fleet_complete());
    assert_eq!(env.step_count(), 6);

    // Placement after the fleet is complete is rejected.
    let late = env.step(100).unwrap();
    assert!(late.info.invalid_action);

    let events = log.events();
    let placed = events
        .iter()
        .filter(|e| matches!(e, EnvEvent::ShipPlaced { player: Player::P1, .. }))
        .count();
    assert_eq!(placed, 5);
    assert!(events.contains(&EnvEvent::SetupComplete {
        first_player: Player::P1
    }));
}

#[test]
fn placing_a_placed_ship_again_is_invalid() {
    let mut env = env(placement_config());
    env.reset(Some(1)).unwrap();
    // Carrier horizontally at (0, 0).
    assert!(!env.step(100).unwrap().info.invalid_action);
    let step = env.step(100 + 55).unwrap();
    assert!(step.info.invalid_action);
    // Battleship overlapping the carrier.
    let step = env.step(100 + 200).unwrap();
    assert!(step.info.invalid_action);
    assert_eq!(env.game().board(Player::P1).ships().len(), 1);
}

#[test]
fn opponent_placement_consults_placement_policy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let log = EventLog::new();
    let mut env = env(EnvConfig {
        allow_opponent_placement: true,
        ..EnvConfig::default()
    })
    .with_placement_policy(move |_: &Observation, mask: &ActionMask| {
        counter.fetch_add(1, Ordering::SeqCst);
        first_legal(mask)
    })
    .with_sink(log.clone());
    assert_eq!(env.action_space().size(), 1100);
    assert_eq!(env.num_channels(), 6);

    let reset = env.reset(Some(2)).unwrap();
    assert_eq!(reset.info.phase, EpisodePhase::Firing);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    let board = env.game().board(Player::P2);
    assert!(board.is_fleet_complete());
    // The first legal placement is always horizontal at the top-left free start.
    assert_eq!(board.ships()[0].start(), Coordinate::new(0, 0));
    let placed = log
        .events()
        .iter()
        .filter(|e| matches!(e, EnvEvent::ShipPlaced { player: Player::P2, .. }))
        .count();
    assert_eq!(placed, 5);
}

#[test]
fn opponent_placement_survives_a_useless_policy() {
    let mut env = env(EnvConfig {
        allow_opponent_placement: true,
        ..EnvConfig::default()
    })
    .with_opponent_policy(|_: &Observation, _: &ActionMask| 0);
    env.reset(Some(2)).unwrap();
    assert!(env.game().board(Player::P2).is_fleet_complete());
    assert_eq!(env.game().phase(), GamePhase::InProgress);
}

#[test]
fn opponent_fleet_is_replaced_when_policy_leaves_no_room() {
    // Without touching, these four ships leave no room for the carrier.
    let space = ActionSpace::new(true);
    let layout: Vec<usize> = [
        (ShipType::Battleship, 1, 4, Orientation::Vertical),
        (ShipType::Cruiser, 8, 3, Orientation::Horizontal),
        (ShipType::Submarine, 5, 7, Orientation::Horizontal),
        (ShipType::Destroyer, 4, 1, Orientation::Vertical),
    ]
    .iter()
    .filter_map(|&(ship_type, row, col, orientation)| {
        space.encode(&Action::Place {
            ship_type,
            start: Coordinate::new(row, col),
            orientation,
        })
    })
    .collect();
    assert_eq!(layout.len(), 4);

    let log = EventLog::new();
    let mut env = env(EnvConfig {
        allow_opponent_placement: true,
        rules: PlacementRules {
            allow_adjacent: false,
        },
        ..EnvConfig::default()
    })
    .with_placement_policy(move |_: &Observation, mask: &ActionMask| {
        layout
            .iter()
            .copied()
            .find(|&action| mask.is_legal(action))
            .unwrap_or(0)
    })
    .with_sink(log.clone());

    let reset = env.reset(Some(3)).unwrap();
    assert_eq!(reset.info.phase, EpisodePhase::Firing);
    assert!(reset.info.action_mask.any());
    let board = env.game().board(Player::P2);
    assert!(board.is_fleet_complete());
    for ship in board.ships() {
        for coord in ship.coords() {
            for neighbor in coord.neighbors() {
                if let Some(other) = board.ship_at(neighbor) {
                    assert_eq!(other.ship_type(), ship.ship_type());
                }
            }
        }
    }
    let policy_placements = log
        .events()
        .iter()
        .filter(|e| matches!(e, EnvEvent::ShipPlaced { player: Player::P2, .. }))
        .count();
    assert_eq!(policy_placements, 4);
    assert!(!env.step(first_legal(&reset.info.action_mask)).unwrap().info.invalid_action);
}

#[test]
fn setup_errors_compare_and_display() {
    let err = EnvError::from(SetupError::FleetIncomplete(Player::P2));
    assert_eq!(err, EnvError::Setup(SetupError::FleetIncomplete(Player::P2)));
    assert!(err.to_string().starts_with("could not set up the game"));
}

#[test]
fn invalid_config_is_rejected() {
    let config = EnvConfig {
        max_steps: 0,
        ..EnvConfig::default()
    };
    assert_eq!(
        BattleshipEnv::new(config).map(|_| ()),
        Err(ConfigError::ZeroMaxSteps)
    );
}

#[test]
fn reward_tags_are_stable() {
    let tags: Vec<&str> = RewardType::ALL.iter().map(|t| t.as_str()).collect();
    assert_eq!(
        tags,
        ["hit", "miss", "win", "loss", "invalid", "placement_complete", "placement"]
    );
    for &tag in RewardType::ALL {
        assert_eq!(
            serde_json::to_string(&tag).unwrap(),
            format!("\"{}\"", tag)
        );
    }
}
