//! `rota` CLI: check and apply staff availability schedules from the command line.
//!
//! Requests use the same JSON payload as the RPC endpoints:
//!
//! ```json
//! {"business_id": 1, "staff_id": 7,
//!  "schedule": [{"day_of_week": "monday", "start_time": "09:00",
//!                "end_time": "12:00", "start_date": "2024-01-01"}]}
//! ```
//!
//! ## Usage
//!
//! ```sh
//! # Report conflicts (read-only)
//! rota --db rota.db check --actor 100 -i schedule.json
//!
//! # Apply a schedule (reads stdin when -i is omitted)
//! cat schedule.json | rota apply --actor 100
//!
//! # Refuse schedules that collide with bookings or manual rota entries
//! rota apply --actor 100 --strict -i schedule.json
//!
//! # Expand the applied schedule into generated rota rows
//! rota generate --business 1 --staff 7
//!
//! # Show the applied schedule
//! rota rules --business 1 --staff 7
//! ```
//!
//! Responses are JSON on stdout. Domain errors print `{"status": CODE, ...}` and
//! exit with status 1.

mod logging;
mod settings;

use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rota_engine::service::{ApplyResponse, CheckResponse, ErrorResponse};
use rota_engine::{ApplyStrictness, Database, ScheduleError, ScheduleRequest, ScheduleService};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "rota", version, about = "Staff rota schedule conflict checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to ./rota.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// SQLite database path (overrides settings)
    #[arg(long, global = true)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report conflicts for a proposed schedule without writing anything
    Check {
        /// Authenticated actor id (must own the business)
        #[arg(long)]
        actor: i64,
        /// Request JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Validate a schedule and atomically replace the applied one
    Apply {
        /// Authenticated actor id (must own the business)
        #[arg(long)]
        actor: i64,
        /// Request JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Also reject rota and booking conflicts
        #[arg(long)]
        strict: bool,
    },
    /// Expand the applied schedule into generated rota rows
    Generate {
        #[arg(long)]
        business: i64,
        #[arg(long)]
        staff: i64,
        /// Horizon for entries without an end date (overrides settings)
        #[arg(long)]
        horizon_days: Option<u32>,
    },
    /// Print the applied schedule rules
    Rules {
        #[arg(long)]
        business: i64,
        #[arg(long)]
        staff: i64,
    },
}

fn main() -> Result<()> {
    logging::init_logger();
    let cli = Cli::parse();

    let mut settings =
        settings::load_settings(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(db) = cli.db {
        settings.database = db;
    }

    let db = Database::open(&settings.database)
        .with_context(|| format!("Failed to open database {}", settings.database))?;

    match cli.command {
        Commands::Check { actor, input } => {
            let request = read_request(input.as_deref())?;
            let service = ScheduleService::with_store(&db, settings.engine);
            match service.check_conflicts(actor, &request) {
                Ok(report) => print_json(&CheckResponse::from(report))?,
                Err(err) => fail(&err)?,
            }
        }
        Commands::Apply {
            actor,
            input,
            strict,
        } => {
            let request = read_request(input.as_deref())?;
            let mut engine = settings.engine;
            if strict {
                engine.apply_strictness = ApplyStrictness::Strict;
            }
            let service = ScheduleService::with_store(&db, engine);
            match service.apply_schedule(actor, &request) {
                Ok(outcome) => print_json(&ApplyResponse::from(outcome))?,
                Err(err) => fail(&err)?,
            }
        }
        Commands::Generate {
            business,
            staff,
            horizon_days,
        } => {
            let mut engine = settings.engine;
            if let Some(days) = horizon_days {
                engine.default_horizon_days = days;
            }
            match rota_engine::generate_rota(&db, staff, business, &engine) {
                Ok(summary) => print_json(&summary)?,
                Err(err) => fail(&err)?,
            }
        }
        Commands::Rules { business, staff } => match db.schedule_rules(staff, business) {
            Ok(rules) => print_json(&rules)?,
            Err(err) => fail(&ScheduleError::from(err))?,
        },
    }

    Ok(())
}

fn read_request(path: Option<&str>) -> Result<ScheduleRequest> {
    let body = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&body).context("Request is not a valid schedule payload")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the caller-facing error body and exit non-zero.
fn fail(err: &ScheduleError) -> Result<()> {
    print_json(&ErrorResponse::from(err))?;
    process::exit(1);
}
