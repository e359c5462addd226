//! Command-line entry point for taskplan.
//!
//! # Responsibility
//! - Map subcommands onto request-layer calls.
//! - Print each JSON response body on stdout.
//!
//! # Invariants
//! - Exit code is non-zero whenever the response status is 400 or above.
//! - `--db` overrides the configured database path.

use clap::{Parser, Subcommand};
use log::error;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use taskplan_api::{ApiResponse, TaskApi};
use taskplan_core::{db::open_db, init_from_config, AppConfig, CalendarDate, SystemClock};

/// Personal task scheduler with recurring dates.
#[derive(Parser)]
#[command(name = "taskplan", version, about)]
struct Cli {
    /// SQLite database file; overrides TASKPLAN_DB_FILE.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the next occurrence of a rule strictly after `now`.
    Nextdate {
        /// Reference date, `YYYYMMDD`; defaults to today.
        #[arg(long)]
        now: Option<String>,
        /// Base date, `YYYYMMDD`.
        #[arg(long)]
        date: String,
        /// Rule: `y` or `d <1..=400>`.
        #[arg(long, default_value = "")]
        repeat: String,
    },
    /// Create a task from a JSON body.
    Add {
        /// `{"date","title","comment","repeat"}`
        json: String,
    },
    /// Replace a task from a JSON body that includes `id`.
    Update { json: String },
    /// Print one task.
    Get { id: String },
    /// Delete one task.
    Delete { id: String },
    /// Complete a task: one-shot tasks are deleted, recurring ones rescheduled.
    Done { id: String },
    /// List upcoming tasks.
    List {
        /// Text, or a `DD.MM.YYYY` date.
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the core crate version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let response = match run(cli) {
        Ok(response) => response,
        Err(message) => {
            eprintln!("{}", json!({ "error": message }));
            return ExitCode::FAILURE;
        }
    };

    println!("{}", response.body);
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(cli: Cli) -> Result<ApiResponse, String> {
    if let Command::Version = cli.command {
        return Ok(version_response());
    }

    let mut config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(db) = cli.db {
        config.db_file = db;
    }
    init_from_config(&config)?;

    let conn = open_db(&config.db_file).map_err(|err| {
        error!(
            "event=cli_start module=cli status=error error_code=db_open_failed error={err}"
        );
        err.to_string()
    })?;
    let api = TaskApi::new(&conn, SystemClock).with_list_limit(config.list_limit);

    Ok(match cli.command {
        Command::Nextdate { now, date, repeat } => {
            let now = now.unwrap_or_else(|| CalendarDate::today().to_canonical());
            api.next_date(&now, &date, &repeat)
        }
        Command::Add { json } => api.add_task(&json),
        Command::Update { json } => api.update_task(&json),
        Command::Get { id } => api.get_task(&id),
        Command::Delete { id } => api.delete_task(&id),
        Command::Done { id } => api.complete_task(&id),
        Command::List { search } => api.list_tasks(search.as_deref()),
        Command::Version => version_response(),
    })
}

fn version_response() -> ApiResponse {
    ApiResponse {
        status: taskplan_api::STATUS_OK,
        body: json!({ "version": taskplan_core::core_version() }),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_nextdate_flags() {
        let cli = Cli::try_parse_from([
            "taskplan", "nextdate", "--now", "20240126", "--date", "20240113", "--repeat", "d 7",
        ])
        .unwrap();
        match cli.command {
            Command::Nextdate { now, date, repeat } => {
                assert_eq!(now.as_deref(), Some("20240126"));
                assert_eq!(date, "20240113");
                assert_eq!(repeat, "d 7");
            }
            _ => panic!("expected nextdate"),
        }
    }

    #[test]
    fn global_db_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["taskplan", "list", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.db.unwrap().to_str(), Some("/tmp/x.db"));
    }
}
