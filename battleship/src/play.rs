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

//! Interactive game against a computer opponent that shoots at random.
use std::io::BufRead;

use anyhow::Result;
use clap::ArgMatches;
use once_cell::sync::Lazy;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;

use battlegym::{
    board::PlacementRules,
    game::{FirstPlayer, GameConfig, MoveError, SetupError},
    BattleshipGame, Coordinate, GamePhase, Orientation, Player, ShipType, ShotOutcome,
};

use crate::{
    display::{self, ROW_LABELS},
    parse_arg, InputReader,
};

/// The human always plays [`Player::P1`].
const HUMAN: Player = Player::P1;
const BOT: Player = Player::P2;

/// Placement command: `place <ship> <row> <col> <dir>`.
static PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^(?:place|put)\s+
        (?P<ship>\w+)\s+
        (?:(?:at|on|to|->|=>)\s+)?
        (?P<row>[0-9]+)(?:\s*,\s*|\s+)(?P<col>[0-9]+)\s+
        (?P<dir>\w+)$",
    )
    .expect("placement regex is valid")
});

static UNPLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?x)^(?:un-?place|remove)\s+(?P<ship>\w+)$").expect("unplace regex is valid")
});

/// Target given as a row letter and a column number, e.g. `c7`.
static TARGET_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<row>[a-z])\s*(?P<col>[0-9]+)$").expect("target regex is valid")
});

/// Target given as `row col` or `row,col`.
static TARGET_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<row>[0-9]+)(?:\s*,\s*|\s+)(?P<col>[0-9]+)$").expect("target regex is valid")
});

pub fn run(matches: &ArgMatches) -> Result<()> {
    let seed: u64 = match parse_arg(matches, "seed")? {
        Some(seed) => seed,
        None => rand::random(),
    };
    println!("Game seed: {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let stdin = std::io::stdin();
    let mut input = InputReader::new(stdin.lock());

    let first_player = match choose_first(matches, &mut input)? {
        Some(first) => first,
        None => return Ok(()),
    };
    let config = GameConfig {
        rules: PlacementRules {
            allow_adjacent: !matches.is_present("no_touching"),
        },
        first_player,
    };
    let mut game = BattleshipGame::with_config(config);

    if matches.is_present("manual") {
        if !choose_placements(&mut rng, &mut game, &mut input)? {
            return Ok(());
        }
    } else {
        game.randomize_remaining(HUMAN, &mut rng)?;
    }
    game.randomize_remaining(BOT, &mut rng)?;
    let first = game.start(&mut rng)?;
    println!();
    println!(
        "{} first.",
        if first == HUMAN { "You go" } else { "The computer goes" }
    );

    while game.phase() == GamePhase::InProgress {
        if game.current_player() == HUMAN {
            if !human_turn(&mut game, &mut input)? {
                return Ok(());
            }
        } else {
            bot_turn(&mut rng, &mut game);
        }
    }

    let view = game.get_state();
    println!();
    println!("Your board:");
    print!("{}", display::render(view.board(HUMAN)));
    println!();
    println!("Computer's board:");
    print!("{}", display::render(view.board(BOT)));
    println!();
    match game.winner() {
        Some(HUMAN) => println!("You win!"),
        _ => println!("The computer wins."),
    }
    Ok(())
}

/// Choose who moves first based on either args or cli input.
fn choose_first<B: BufRead>(
    matches: &ArgMatches,
    input: &mut InputReader<B>,
) -> Result<Option<FirstPlayer>> {
    Ok(if let Some(choice) = matches.value_of("first") {
        Some(match choice.to_ascii_lowercase().as_str() {
            "human" | "me" => FirstPlayer::Fixed(HUMAN),
            "computer" | "bot" => FirstPlayer::Fixed(BOT),
            _ => FirstPlayer::Seeded,
        })
    } else {
        input.read_input_lower("Do you want to go first? (Y/n/random)", |input| match input {
            "yes" | "y" | "first" | "1" | "1st" | "" => Some(FirstPlayer::Fixed(HUMAN)),
            "no" | "n" | "second" | "2" | "2nd" => Some(FirstPlayer::Fixed(BOT)),
            "random" | "rand" | "r" => Some(FirstPlayer::Seeded),
            _ => {
                println!("Invalid selection.");
                None
            }
        })?
    })
}

fn parse_ship(name: &str) -> Option<ShipType> {
    match name {
        "cv" | "carrier" => Some(ShipType::Carrier),
        "bb" | "battleship" => Some(ShipType::Battleship),
        "ca" | "cl" | "cruiser" => Some(ShipType::Cruiser),
        "ss" | "sub" | "submarine" => Some(ShipType::Submarine),
        "dd" | "destroyer" => Some(ShipType::Destroyer),
        _ => None,
    }
}

fn parse_orientation(name: &str) -> Option<Orientation> {
    match name {
        "h" | "horizontal" | "right" | "r" | "across" => Some(Orientation::Horizontal),
        "v" | "vertical" | "down" | "d" => Some(Orientation::Vertical),
        _ => None,
    }
}

enum Command {
    Done,
    Place(ShipType, Coordinate, Orientation),
    Unplace(ShipType),
    Clear,
    RandomizeRest,
    Help,
}

fn parse_command(input: &str) -> Option<Command> {
    match input {
        "?" | "help" | "h" => return Some(Command::Help),
        "randomize" | "rand" | "random" => return Some(Command::RandomizeRest),
        "done" | "start" => return Some(Command::Done),
        "clear" => return Some(Command::Clear),
        _ => {}
    }
    if let Some(captures) = PLACE.captures(input) {
        let ship = match parse_ship(&captures["ship"]) {
            Some(ship) => ship,
            None => {
                println!(
                    "invalid ship: {}, choose \"carrier\", \"battleship\", \"cruiser\", \"submarine\", or \"destroyer\"",
                    &captures["ship"]
                );
                return None;
            }
        };
        let (row, col) = match (captures["row"].parse(), captures["col"].parse()) {
            (Ok(row), Ok(col)) => (row, col),
            _ => {
                println!("row and column must be numbers in range [0,9]");
                return None;
            }
        };
        let dir = match parse_orientation(&captures["dir"]) {
            Some(dir) => dir,
            None => {
                println!(
                    "invalid direction {}, choose \"h\" (horizontal) or \"v\" (vertical)",
                    &captures["dir"]
                );
                return None;
            }
        };
        Some(Command::Place(ship, Coordinate::new(row, col), dir))
    } else if let Some(captures) = UNPLACE.captures(input) {
        match &captures["ship"] {
            "all" => Some(Command::Clear),
            name => match parse_ship(name) {
                Some(ship) => Some(Command::Unplace(ship)),
                None => {
                    println!(
                        "invalid ship: {}, choose \"carrier\", \"battleship\", \"cruiser\", \"submarine\", \"destroyer\", or \"all\"",
                        name
                    );
                    None
                }
            },
        }
    } else {
        println!(
            "Invalid ship-placement command \"{}\". Use '?' for help",
            input
        );
        None
    }
}

/// Choose placements for all ships using input from the player. Returns false if input
/// ended before the player was done.
fn choose_placements<B: BufRead>(
    rng: &mut impl Rng,
    game: &mut BattleshipGame,
    input: &mut InputReader<B>,
) -> Result<bool> {
    println!();
    println!("Place ships. Type help or ? for commands.");
    loop {
        println!();
        let board = game.board(HUMAN);
        if board.is_fleet_complete() {
            println!("All ships placed, type done to start the game");
        } else {
            let pending: Vec<&str> = ShipType::iter_set(board.pending())
                .map(ShipType::name)
                .collect();
            println!("Remaining ships to place: {}", pending.join(", "));
        }
        println!("Your current board setup:");
        print!("{}", display::render(&game.player_view(HUMAN).own));
        println!();

        let cmd = match input.read_input_lower(">", parse_command)? {
            Some(cmd) => cmd,
            None => return Ok(false),
        };

        match cmd {
            Command::Done if game.board(HUMAN).is_fleet_complete() => return Ok(true),
            Command::Done => println!("You must place all your ships first!"),
            Command::Place(ship, start, dir) => {
                let previous = game
                    .board(HUMAN)
                    .ship(ship)
                    .map(|placed| (placed.start(), placed.orientation()));
                game.unplace_ship(HUMAN, ship)?;
                match game.place_ship(HUMAN, ship, start, dir) {
                    Ok(()) => {}
                    Err(SetupError::Placement(err)) => {
                        println!("Invalid placement: {}.", err.reason());
                        if let Some((start, dir)) = previous {
                            game.place_ship(HUMAN, ship, start, dir)?;
                        }
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Command::Unplace(ship) => {
                game.unplace_ship(HUMAN, ship)?;
            }
            Command::Clear => {
                for &ship in ShipType::ALL {
                    game.unplace_ship(HUMAN, ship)?;
                }
            }
            Command::RandomizeRest => match game.randomize_remaining(HUMAN, rng) {
                Ok(()) => {}
                Err(SetupError::Placement(err)) => {
                    println!("Cannot randomize: {}. Clear some ships first.", err.reason());
                }
                Err(err) => return Err(err.into()),
            },
            Command::Help => {
                println!(
                    "Available Commands:
    done                             if all ships are placed, start the game.
    place <ship> <row> <col> <dir>   place the ship with its top-left end at the given cell.
        Possible directions are \"h\" (horizontal) and \"v\" (vertical). See below for ships.
    unplace <ship>                   clear the placement of the specified ship.
        Additionally \"all\" may be specified to clear all placements.
    clear                            clears all ship placements.
    randomize                        randomize the placements of the remaining ships.

Available Ships:
    \"carrier\" (\"cv\")
    \"battleship\" (\"bb\")
    \"cruiser\" (\"cl\")
    \"submarine\" (\"ss\")
    \"destroyer\" (\"dd\")",
                );
            }
        }
    }
}

/// Parse a target such as `c7`, `2 7` or `2,7`. Numbers are not range checked so that
/// the game can report out of bounds targets itself.
fn parse_target(input: &str) -> Option<Coordinate> {
    if let Some(captures) = TARGET_LABEL.captures(input) {
        let letter = captures["row"].as_bytes()[0].to_ascii_uppercase();
        let row = ROW_LABELS
            .iter()
            .position(|&label| label == letter)
            .unwrap_or(letter.saturating_sub(b'A') as usize);
        let col = captures["col"].parse().ok()?;
        return Some(Coordinate::new(row, col));
    }
    let captures = TARGET_PAIR.captures(input)?;
    Some(Coordinate::new(
        captures["row"].parse().ok()?,
        captures["col"].parse().ok()?,
    ))
}

/// Read one shot from the player and apply it. Returns false if input ended.
fn human_turn<B: BufRead>(game: &mut BattleshipGame, input: &mut InputReader<B>) -> Result<bool> {
    let view = game.player_view(HUMAN);
    println!();
    println!("Your board:");
    print!("{}", display::render(&view.own));
    println!();
    println!("Enemy board:");
    print!("{}", display::render(&view.opponent));
    println!();

    loop {
        let target = input.read_input_lower("Target (e.g. C7 or 2 7):", |input| {
            let target = parse_target(input);
            if target.is_none() {
                println!("Could not read target \"{}\".", input);
            }
            target
        })?;
        let target = match target {
            Some(target) => target,
            None => return Ok(false),
        };
        match game.make_move(HUMAN, target) {
            Ok(outcome) => {
                println!("{}: {}", display::label(target), describe(outcome, "You"));
                return Ok(true);
            }
            Err(err @ MoveError::OutOfBounds(_)) | Err(err @ MoveError::DuplicateShot(_)) => {
                println!("Invalid target: {}.", err);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// The computer fires at a random cell it has not targeted yet.
fn bot_turn(rng: &mut impl Rng, game: &mut BattleshipGame) {
    let target = match game.valid_moves(BOT).choose(rng) {
        Some(&target) => target,
        None => return,
    };
    match game.make_move(BOT, target) {
        Ok(outcome) => println!(
            "Computer fires at {}: {}",
            display::label(target),
            describe(outcome, "The computer")
        ),
        Err(err) => tracing::error!(%err, "bot_move_rejected"),
    }
}

fn describe(outcome: ShotOutcome, shooter: &str) -> String {
    match outcome {
        ShotOutcome::Miss => "miss.".to_string(),
        ShotOutcome::Hit(_) => "hit!".to_string(),
        ShotOutcome::Sunk(ship) => format!("hit! {} sank a {}.", shooter, ship),
        ShotOutcome::Defeated(ship) => {
            format!("hit! {} sank a {}, the last ship of the fleet.", shooter, ship)
        }
    }
}
