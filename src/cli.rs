use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lasttouch", about = "Index git history for last-touching-commit lookups")]
pub struct Cli {
    /// Path to the index database (defaults to the user cache directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a repository under a short name
    Register {
        name: String,
        /// Path to the git repository (working tree or bare)
        path: PathBuf,
    },
    /// Synchronize a repository's index with its current branch heads
    Sync {
        name: String,
        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },
    /// Look up the commit that last produced or modified an object
    Lookup {
        name: String,
        /// Object id (40-character hex)
        object: String,
        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the recorded predecessor objects of an object
    Predecessors {
        name: String,
        /// Object id (40-character hex)
        object: String,
    },
    /// List registered repositories
    List,
}
