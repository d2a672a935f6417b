use clap::{Parser, Subcommand};

use pingme::config::Config;

#[derive(Parser)]
#[command(name = "pingme", about = "Task board with scheduled reminders", version)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the JSON API and the web board
    Serve,

    /// Create the database and tables (idempotent)
    Init,

    /// Print the board grouped by status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
