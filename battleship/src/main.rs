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
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing_subscriber::filter::EnvFilter;

mod display;
mod play;
mod simulate;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = App::new("Battleship")
        .version("1.0")
        .author("Zachary Stewart <zachary@zstewart.com>")
        .about("Command line battleship and random rollouts of the training environment.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("play")
                .about("play against a random computer opponent")
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .value_name("SEED")
                        .help("seed for ship placement and the computer's shots")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("manual")
                        .long("manual")
                        .short("m")
                        .help("place your own ships"),
                )
                .arg(
                    Arg::with_name("no_touching")
                        .long("no-touching")
                        .help("forbid ships from touching, including diagonally"),
                )
                .arg(
                    Arg::with_name("first")
                        .short("f")
                        .long("first")
                        .value_name("FIRST_PLAYER")
                        .help("pre-specify which player goes first")
                        .takes_value(true)
                        .possible_values(&["human", "me", "computer", "bot", "random", "rand"])
                        .case_insensitive(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("simulate")
                .about("run random-agent episodes through the environment")
                .arg(
                    Arg::with_name("episodes")
                        .long("episodes")
                        .short("n")
                        .value_name("N")
                        .default_value("100")
                        .help("number of episodes"),
                )
                .arg(
                    Arg::with_name("seed")
                        .long("seed")
                        .value_name("SEED")
                        .takes_value(true)
                        .help("seed of the first episode; later episodes continue its stream"),
                )
                .arg(
                    Arg::with_name("agent_placement")
                        .long("agent-placement")
                        .help("the agent places its own fleet"),
                )
                .arg(
                    Arg::with_name("opponent_placement")
                        .long("opponent-placement")
                        .help("the opponent places its fleet through its policy"),
                )
                .arg(
                    Arg::with_name("max_steps")
                        .long("max-steps")
                        .value_name("N")
                        .takes_value(true)
                        .help("truncate episodes after this many steps"),
                )
                .arg(
                    Arg::with_name("config")
                        .long("config")
                        .short("c")
                        .value_name("FILE")
                        .takes_value(true)
                        .help("JSON environment configuration; flags override it"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("play", Some(sub)) => play::run(sub),
        ("simulate", Some(sub)) => simulate::run(sub),
        _ => Ok(()),
    }
}

/// Parse an optional numeric argument.
fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .map(|raw| {
            raw.parse()
                .with_context(|| format!("invalid value for --{}: {:?}", name, raw))
        })
        .transpose()
}

/// Helper to read input from the player.
struct InputReader<B> {
    read: B,
    buf: String,
}

impl<B> InputReader<B> {
    fn new(read: B) -> Self {
        Self {
            read,
            buf: String::new(),
        }
    }
}

impl<B: BufRead> InputReader<B> {
    /// Repeatedly tries to read input until the input checker returns `Some`. Converts
    /// to ascii lower before running the checker. Returns `None` at end of input.
    fn read_input_lower<F, T>(&mut self, prompt: &str, mut checker: F) -> io::Result<Option<T>>
    where
        F: FnMut(&str) -> Option<T>,
    {
        loop {
            if !self.read_input_inner(prompt)? {
                return Ok(None);
            }
            self.buf.make_ascii_lowercase();
            if let Some(val) = checker(self.buf.trim()) {
                return Ok(Some(val));
            }
        }
    }

    /// Print the prompt, clear the string buffer and read a line. Returns false at end of
    /// input.
    fn read_input_inner(&mut self, prompt: &str) -> io::Result<bool> {
        print!("{} ", prompt);
        io::stdout().flush()?;
        self.buf.clear();
        if self.read.read_line(&mut self.buf)? == 0 {
            println!();
            return Ok(false);
        }
        Ok(true)
    }
}
