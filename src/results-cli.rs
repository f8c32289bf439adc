//! A CLI tool for publishing election results straight from the database.
//! It shares the server's tally implementation, so its output always agrees
//! with the results endpoints.

use std::fmt::Write;

use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use votebooth_backend::{
    config::{open, DbConfig},
    error::Error as BackendError,
    model::api::results::PositionResults,
    voting::{
        store::{BallotStore, MongoStore},
        tally::results_for,
    },
};

const PROGRAM_NAME: &str = "votebooth-results";

const ABOUT_TEXT: &str = "Print the tally and winners of each position.

Nothing is written to the database. It is configured like the server,
through `Rocket.toml` and `ROCKET_DB_URI` / `ROCKET_DB_NAME`; the options
below take precedence.

EXIT CODES:
     0: Results printed.
 Other: Error.";

const DB_URI: &str = "DB_URI";
const DB_NAME: &str = "DB_NAME";
const POSITION: &str = "POSITION";
const INCLUDE_CLOSED: &str = "INCLUDE_CLOSED";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(DB_URI)
                .long("db-uri")
                .help("MongoDB connection string")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(DB_NAME)
                .long("db-name")
                .help("Name of the election database")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(POSITION)
                .long("position")
                .help("Only print this position")
                .value_parser(clap::value_parser!(u32))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(INCLUDE_CLOSED)
                .long("include-closed")
                .help("Also print positions that are closed for voting")
                .action(ArgAction::SetTrue),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Error)]
enum Error {
    #[error("Invalid database configuration: {0}")]
    Config(String),
    #[error("No such position: {0}")]
    NoSuchPosition(u32),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.into())
    }
}

/// Resolve the database config from the figment, overridden by the command line.
fn db_config(matches: &ArgMatches) -> Result<DbConfig, Error> {
    let mut figment = rocket::Config::figment();
    if let Some(uri) = matches.get_one::<String>(DB_URI) {
        figment = figment.merge(("db_uri", uri));
    }
    if let Some(name) = matches.get_one::<String>(DB_NAME) {
        figment = figment.merge(("db_name", name));
    }
    figment
        .extract::<DbConfig>()
        .map_err(|err| Error::Config(err.to_string()))
}

async fn load_results(store: &MongoStore, matches: &ArgMatches) -> Result<Vec<PositionResults>, Error> {
    let include_closed = matches.get_flag(INCLUDE_CLOSED);
    let positions = match matches.get_one::<u32>(POSITION).copied() {
        Some(id) => {
            let position = store
                .position(id)
                .await?
                .filter(|position| include_closed || position.is_open())
                .ok_or(Error::NoSuchPosition(id))?;
            vec![position]
        }
        None if include_closed => store.all_positions().await?,
        None => store.open_positions().await?,
    };
    Ok(results_for(store, &positions).await?)
}

/// Render results as plain text, one block per position.
fn render(results: &[PositionResults]) -> String {
    let mut out = String::new();
    for PositionResults { tally, winners } in results {
        let _ = writeln!(
            out,
            "{} ({} seat{}, {} voter{})",
            tally.name,
            tally.seat_count,
            if tally.seat_count != 1 { "s" } else { "" },
            tally.voters,
            if tally.voters != 1 { "s" } else { "" },
        );
        for entry in &tally.entries {
            let elected = winners
                .winners
                .iter()
                .any(|w| w.candidate_id == entry.candidate_id);
            let _ = writeln!(
                out,
                "  {}: {} vote{} ({:.2}%){}",
                entry.name,
                entry.votes,
                if entry.votes != 1 { "s" } else { "" },
                entry.percentage,
                if elected { " ELECTED" } else { "" },
            );
        }
        if !winners.tied_at_cutoff.is_empty() {
            let tied: Vec<_> = tally
                .entries
                .iter()
                .filter(|e| winners.tied_at_cutoff.contains(&e.candidate_id))
                .map(|e| e.name.as_str())
                .collect();
            let _ = writeln!(
                out,
                "  Tie for the last seat between {}, settled by candidate ID",
                tied.join(", ")
            );
        }
        out.push('\n');
    }
    out
}

async fn run(matches: &ArgMatches) -> Result<String, Error> {
    let config = db_config(matches)?;
    let store = open(&config).await?;
    let results = load_results(&store, matches).await?;
    Ok(render(&results))
}

#[rocket::main]
async fn main() {
    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
