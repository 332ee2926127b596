use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weatherlog_core::{
    Config, ProviderId, RequestError, RequestOrchestrator, SqliteHistoryStore, gateway_from_config,
};

use crate::render::TerminalRenderer;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherlog", version, about = "Weather lookups with a local request history")]
pub struct Cli {
    /// History database to use instead of the configured one.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print diagnostic logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a provider: openweather, visualcrossing or ipinfo.
    Configure {
        provider: String,
    },

    /// Show weather for a location and record it in the history.
    Fetch {
        /// "City, State, Country", "City Country", or "auto" to detect from your IP.
        #[arg(required = true, num_args = 1..)]
        location: Vec<String>,

        /// First day of a historical range (YYYY-MM-DD). Needs --end.
        #[arg(long, value_parser = parse_date)]
        start: Option<String>,

        /// Last day of a historical range (YYYY-MM-DD). Needs --start.
        #[arg(long, value_parser = parse_date)]
        end: Option<String>,
    },

    /// List past requests.
    History,

    /// Show the weather of a past request again without recording it.
    Replay { id: i64 },

    /// Change the recorded temperature of a past request.
    Update {
        id: i64,

        /// New temperature text, e.g. "72°F". Prompted for when omitted.
        #[arg(long)]
        temperature: Option<String>,
    },

    /// Remove a past request from the history.
    Delete { id: i64 },
}

fn parse_date(value: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|err| format!("expected a YYYY-MM-DD date: {err}"))
}

fn exit_code<T>(result: Result<T, RequestError>) -> ExitCode {
    // The renderer has already shown the error.
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let mut config = Config::load()?;

        if let Command::Configure { provider } = &self.command {
            configure(&mut config, provider)?;
            return Ok(ExitCode::SUCCESS);
        }

        let db_path = match self.db {
            Some(path) => path,
            None => config.database_path()?,
        };
        let store = SqliteHistoryStore::open(&db_path, config.storage.reset_on_startup)
            .with_context(|| format!("Failed to open history at {}", db_path.display()))?;
        let gateway = gateway_from_config(&config)?;
        let renderer = TerminalRenderer;
        let mut orchestrator = RequestOrchestrator::new(&gateway, &store, &renderer);

        let code = match self.command {
            Command::Configure { .. } => ExitCode::SUCCESS,
            Command::Fetch { location, start, end } => {
                if start.is_some() != end.is_some() {
                    tracing::warn!(
                        "Historical weather needs both --start and --end; showing current weather"
                    );
                }
                let start = start.unwrap_or_default();
                let end = end.unwrap_or_default();
                exit_code(orchestrator.submit(&location.join(" "), &start, &end).await)
            }
            Command::History => exit_code(orchestrator.refresh_records()),
            Command::Replay { id } => exit_code(orchestrator.replay(id).await),
            Command::Update { id, temperature } => {
                let temperature = match temperature {
                    Some(t) => t,
                    None => Text::new("Enter new temperature:").prompt()?,
                };
                if temperature.trim().is_empty() {
                    println!("No temperature entered; record {id} left unchanged.");
                    ExitCode::SUCCESS
                } else {
                    exit_code(orchestrator.update_temperature(id, &temperature))
                }
            }
            Command::Delete { id } => exit_code(orchestrator.delete_record(id)),
        };

        Ok(code)
    }
}

fn configure(config: &mut Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = Password::new(&format!("API key for {id} ({}):", id.purpose()))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key for '{id}' must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved API key for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}
