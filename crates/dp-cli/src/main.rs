use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dp_cli::commands::{day, log, sessions, status, totals, watch, wipe};
use dp_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match cli.command {
        Some(Commands::Watch { name, no_start }) => {
            drop(stdout);
            watch::run(&config, name, !no_start)?;
        }
        Some(Commands::Sessions { json }) => sessions::run(&mut stdout, &config, json)?,
        Some(Commands::Delete { id }) => sessions::delete(&mut stdout, &config, id)?,
        Some(Commands::Clear) => sessions::clear(&mut stdout, &config)?,
        Some(Commands::Totals { span, json }) => totals::run(&mut stdout, &config, span, json)?,
        Some(Commands::Day { date, step, json }) => {
            day::run(&mut stdout, &config, &date, step, json)?;
        }
        Some(Commands::Log { limit, json }) => log::run(&mut stdout, &config, limit, json)?,
        Some(Commands::Status) => status::run(&mut stdout, &config)?,
        Some(Commands::Wipe { yes }) => wipe::run(&mut stdout, &config, yes)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
