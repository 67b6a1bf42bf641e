//! CLI subcommand implementations.

pub mod day;
pub mod log;
pub mod sessions;
pub mod status;
pub mod totals;
pub mod util;
pub mod watch;
pub mod wipe;
