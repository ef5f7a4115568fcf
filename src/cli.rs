use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chardb")]
#[command(author, version, about = "Character persistence for role-playing games")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `demo`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a sample class and characters and print their ids
    Demo,

    /// Bring the database schema up to date and report what changed
    Migrate,

    /// Print a stored character as JSON
    Show {
        /// Character id
        id: i64,
    },

    /// Display version information
    Version,
}
