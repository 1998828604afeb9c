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

//! Characterization tests for concrete engine and environment scenarios.
use battlegym::{
    board::{CannotPlaceReason, CannotShootReason, PlacementRules},
    env::{BattleshipEnv, EnvConfig, RewardType},
    game::{GameConfig, MoveError, SetupError},
    BattleshipGame, Board, CellState, Coordinate, GamePhase, Orientation, Player, ShipType,
    ShotOutcome,
};

#[test]
fn destroyer_sinks_only_after_both_cells_hit() {
    let mut board = Board::new();
    board
        .place_ship(ShipType::Destroyer, Coordinate::new(0, 0), Orientation::Horizontal)
        .unwrap();

    let first = board.receive_shot(Coordinate::new(0, 0)).unwrap();
    assert!(first.is_hit());
    assert!(!first.sunk());
    assert_eq!(first.sunk_ship(), None);
    assert!(!board.ship(ShipType::Destroyer).unwrap().is_sunk());

    let second = board.receive_shot(Coordinate::new(0, 1)).unwrap();
    assert!(second.is_hit());
    assert!(second.sunk());
    assert_eq!(second.sunk_ship(), Some(ShipType::Destroyer));
    assert!(board.ship(ShipType::Destroyer).unwrap().is_sunk());
}

#[test]
fn placement_failures_leave_board_unchanged() {
    let mut board = Board::new();
    board
        .place_ship(ShipType::Carrier, Coordinate::new(2, 2), Orientation::Vertical)
        .unwrap();

    let err = board
        .place_ship(ShipType::Battleship, Coordinate::new(0, 7), Orientation::Horizontal)
        .unwrap_err();
    assert_eq!(err.reason(), CannotPlaceReason::OutOfBounds);

    let err = board
        .place_ship(ShipType::Battleship, Coordinate::new(4, 0), Orientation::Horizontal)
        .unwrap_err();
    assert_eq!(err.reason(), CannotPlaceReason::Overlap);
    assert_eq!(board.ships().len(), 1);
    assert_eq!(board.ship_at(Coordinate::new(4, 0)), None);
}

#[test]
fn touching_ships_only_rejected_when_configured() {
    for &(allow_adjacent, expected) in &[(true, None), (false, Some(CannotPlaceReason::Adjacent))] {
        let mut board = Board::with_rules(PlacementRules { allow_adjacent });
        board
            .place_ship(ShipType::Cruiser, Coordinate::new(0, 0), Orientation::Horizontal)
            .unwrap();
        let result = board
            .place_ship(ShipType::Submarine, Coordinate::new(1, 3), Orientation::Horizontal)
            .map(|_| ())
            .map_err(|err| err.reason());
        assert_eq!(result.err(), expected);
    }
}

#[test]
fn setup_random_42_is_reproducible() {
    let mut a = BattleshipGame::new();
    let mut b = BattleshipGame::new();
    a.setup_random(42).unwrap();
    b.setup_random(42).unwrap();
    for &player in Player::ALL {
        assert_eq!(a.board(player).ships(), b.board(player).ships());
    }
    assert_eq!(
        serde_json::to_string(&a.get_state()).unwrap(),
        serde_json::to_string(&b.get_state()).unwrap()
    );
}

#[test]
fn out_of_bounds_shot_rejected_everywhere() {
    let mut board = Board::new();
    board
        .place_ship(ShipType::Destroyer, Coordinate::new(9, 8), Orientation::Horizontal)
        .unwrap();
    let err = board.receive_shot(Coordinate::new(10, 0)).unwrap_err();
    assert_eq!(err.reason(), CannotShootReason::OutOfBounds);
    assert_eq!(board.shot_count(), 0);

    let mut game = BattleshipGame::new();
    game.setup_random(3).unwrap();
    let before = game.get_state();
    assert_eq!(
        game.make_move(Player::P1, Coordinate::new(10, 0)),
        Err(MoveError::OutOfBounds(Coordinate::new(10, 0)))
    );
    assert_eq!(game.get_state(), before);
    assert_eq!(game.current_player(), Player::P1);

    let mut env = BattleshipEnv::new(EnvConfig::default()).unwrap();
    env.reset(Some(3)).unwrap();
    let before = env.game().get_state();
    let step = env.step(100).unwrap();
    assert_eq!(step.info.reward_type, RewardType::Invalid);
    assert_eq!(step.reward, EnvConfig::default().rewards.invalid);
    assert_eq!(env.game().get_state(), before);
}

#[test]
fn scripted_game_ends_with_player_one_winning() {
    let mut game = BattleshipGame::new();
    game.setup_random(1234).unwrap();
    let targets: Vec<Coordinate> = game
        .board(Player::P2)
        .ships()
        .iter()
        .flat_map(|ship| ship.coords().to_vec())
        .collect();
    assert_eq!(targets.len(), 17);
    let replies: Vec<Coordinate> = Coordinate::all()
        .filter(|&c| game.board(Player::P1).ship_at(c).is_none())
        .take(16)
        .collect();

    for (n, &target) in targets.iter().enumerate() {
        assert_eq!(game.phase(), GamePhase::InProgress);
        let outcome = game.make_move(Player::P1, target).unwrap();
        assert!(outcome.is_hit());
        if n < 16 {
            assert_eq!(game.make_move(Player::P2, replies[n]), Ok(ShotOutcome::Miss));
        }
    }
    assert_eq!(game.phase(), GamePhase::Finished);
    assert_eq!(game.winner(), Some(Player::P1));
    assert!(game
        .board(Player::P2)
        .shots()
        .all(|(_, state)| state == CellState::Hit));
}

#[test]
fn manual_setup_then_start() {
    let mut game = BattleshipGame::new();
    game.place_ship(Player::P1, ShipType::Carrier, Coordinate::new(0, 0), Orientation::Horizontal)
        .unwrap();
    assert!(matches!(
        game.place_ship(Player::P1, ShipType::Carrier, Coordinate::new(5, 5), Orientation::Vertical),
        Err(SetupError::Placement(_))
    ));
    assert!(game.unplace_ship(Player::P1, ShipType::Carrier).unwrap());
    assert!(!game.unplace_ship(Player::P1, ShipType::Carrier).unwrap());

    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(10);
    game.randomize_remaining(Player::P1, &mut rng).unwrap();
    game.randomize_remaining(Player::P2, &mut rng).unwrap();
    assert_eq!(game.start(&mut rng).unwrap(), Player::P1);
    assert!(matches!(
        game.place_ship(Player::P1, ShipType::Carrier, Coordinate::new(0, 0), Orientation::Horizontal),
        Err(SetupError::AlreadyStarted(GamePhase::InProgress))
    ));
    assert_eq!(game.valid_moves(Player::P1).len(), 100);
}

#[test]
fn randomize_reports_when_no_room_is_left() {
    let mut game = BattleshipGame::with_config(GameConfig {
        rules: PlacementRules {
            allow_adjacent: false,
        },
        ..GameConfig::default()
    });
    let layout = [
        (ShipType::Battleship, 1, 4, Orientation::Vertical),
        (ShipType::Cruiser, 8, 3, Orientation::Horizontal),
        (ShipType::Submarine, 5, 7, Orientation::Horizontal),
        (ShipType::Destroyer, 4, 1, Orientation::Vertical),
    ];
    for &(ship, row, col, dir) in &layout {
        game.place_ship(Player::P1, ship, Coordinate::new(row, col), dir)
            .unwrap();
    }

    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(4);
    match game.randomize_remaining(Player::P1, &mut rng) {
        Err(SetupError::Placement(err)) => {
            assert_eq!(err.reason(), CannotPlaceReason::InsufficientSpace);
            assert_eq!(err.ship().ship_type(), ShipType::Carrier);
        }
        other => panic!("expected no room for the carrier, got {:?}", other),
    }
    assert_eq!(game.board(Player::P1).ships().len(), 4);

    for &(ship, ..) in &layout {
        assert!(game.unplace_ship(Player::P1, ship).unwrap());
    }
    game.randomize_remaining(Player::P1, &mut rng).unwrap();
    assert!(game.board(Player::P1).is_fleet_complete());
}
