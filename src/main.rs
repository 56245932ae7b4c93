//! ZwiftPower CLI - league standings, event results and team rosters.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use zwiftpower::auth::{Credentials, flow_for_config};
use zwiftpower::config::Config;
use zwiftpower::console::Console;
use zwiftpower::error::ConfigError;
use zwiftpower::reports::{Tabular, render_tsv};
use zwiftpower::{Client, logging};

/// League and team reports from zwiftpower.com.
#[derive(Parser, Debug)]
#[command(name = "zwiftpower")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of tab-separated tables.
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overall, women's and team standings of a league.
    Gc {
        /// League identifier.
        league_id: String,
    },
    /// Every event result of a league, best time per rider.
    Events {
        /// League identifier.
        league_id: String,
    },
    /// Roster of the configured team.
    Roster,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    let console = Console::new();

    console.section("ZwiftPower Reports");

    console.step("Loading configuration...");
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path).context("Failed to load configuration")?;

    match config.validate() {
        Ok(()) => {}
        Err(ConfigError::MissingValue(key)) => {
            console.warning(&format!(
                "{} is not set. Please edit: {}",
                key,
                config_path.display()
            ));
            return Ok(());
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    }
    console.success("Configuration loaded");

    let flow = flow_for_config(&config);
    console.step(&format!("Logging in ({})...", flow.name()));
    let credentials = Credentials::new(&config.account.username, &config.account.password);
    let client = Client::connect(flow.as_ref(), &credentials, &config)
        .await
        .context("Failed to log in")?;
    console.success("Logged in");

    match &args.command {
        Command::Gc { league_id } => {
            console.step(&format!("Fetching standings for league {}...", league_id));
            let standings = client
                .league_gc_results(league_id)
                .await
                .context("Failed to fetch league standings")?;

            if args.json {
                print_json(&standings)?;
            } else {
                print_table(&console, "overall", &standings.overall);
                print_table(&console, "women", &standings.women);
                print_table(&console, "teams", &standings.teams);
            }
        }
        Command::Events { league_id } => {
            console.step(&format!("Fetching event results for league {}...", league_id));
            let results = client
                .league_event_results(league_id)
                .await
                .context("Failed to fetch league event results")?;
            emit(&console, args.json, "results", &results)?;
        }
        Command::Roster => {
            console.step(&format!("Fetching roster for team {}...", config.site.team_id));
            let roster = client.team_roster().await.context("Failed to fetch team roster")?;
            emit(&console, args.json, "roster", &roster)?;
        }
    }

    Ok(())
}

fn emit<T: Tabular + Serialize>(console: &Console, json: bool, name: &str, rows: &[T]) -> Result<()> {
    if json {
        print_json(&rows)
    } else {
        print_table(console, name, rows);
        Ok(())
    }
}

fn print_table<T: Tabular>(console: &Console, name: &str, rows: &[T]) {
    console.info(&console.table_summary(name, rows.len()));
    print!("{}", render_tsv(rows));
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{}", rendered);
    Ok(())
}
