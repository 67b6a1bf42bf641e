//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dp_core::Span;
use uuid::Uuid;

/// Presence-driven session timer.
///
/// Counts time only while you are at your desk, logs every change to a CSV
/// file and keeps finished sessions in a JSON archive.
#[derive(Debug, Parser)]
#[command(name = "dp", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the timer, reading presence samples from stdin.
    ///
    /// Each line is one of: `1`/`present`, `0`/`absent`, `start`, `stop`,
    /// or `name <text>`. End of input or Ctrl-C ends the session.
    Watch {
        /// Name for the session.
        #[arg(short, long)]
        name: Option<String>,

        /// Wait for a `start` line instead of starting immediately.
        #[arg(long)]
        no_start: bool,
    },

    /// List finished sessions, most recent first.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete one finished session.
    Delete {
        /// Session id as shown by `dp sessions`.
        id: Uuid,
    },

    /// Delete all finished sessions. The event log is kept.
    Clear,

    /// Show per-day totals.
    Totals {
        /// Number of days (7, 30, 90) or `all`.
        #[arg(long, default_value = "30")]
        span: Span,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the intra-day distribution of tracked time.
    Day {
        /// Day to show: YYYY-MM-DD, `today`, `yesterday` or `N days ago`.
        #[arg(long, default_value = "today")]
        date: String,

        /// Bin width in minutes.
        #[arg(long, default_value_t = 60)]
        step: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the tail of the event log.
    Log {
        /// Number of rows to show.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show data locations and archive summary.
    Status,

    /// Delete all sessions and the event log.
    Wipe {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn totals_span_parses() {
        let cli = Cli::try_parse_from(["dp", "totals", "--span", "all"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Totals {
                span: Span::All,
                json: false
            })
        ));

        let cli = Cli::try_parse_from(["dp", "totals"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Totals {
                span: Span::Days(30),
                ..
            })
        ));
    }

    #[test]
    fn delete_requires_uuid() {
        assert!(Cli::try_parse_from(["dp", "delete", "not-a-uuid"]).is_err());
    }
}
