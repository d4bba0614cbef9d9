use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for citysearch
#[derive(Debug, Parser)]
#[command(
    name = "citysearch",
    version,
    about = "Look up US cities from the embedded instant tier and an on-demand full dataset"
)]
pub struct CliArgs {
    /// Full-tier dataset: a file path or http(s) URL (overrides config and CITYSEARCH_DATASET)
    #[arg(short = 'd', long = "dataset", global = true)]
    pub dataset: Option<String>,

    /// Path to a TOML config file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ranked search by city name, "City, ST", county, or state code
    Search {
        /// Query text (at least 2 characters)
        query: String,

        /// Restrict to one state, by code (TX) or name (Texas)
        #[arg(short, long)]
        state: Option<String>,

        /// Maximum number of results (default from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Do not load the full dataset
        #[arg(long)]
        instant_only: bool,
    },

    /// Resolve a previously selected "City, ST" value
    Lookup {
        /// Display name, e.g. "Phoenix, AZ"
        display: String,

        /// Do not load the full dataset
        #[arg(long)]
        instant_only: bool,
    },

    /// Show city and state counts per tier
    Stats {
        /// Do not load the full dataset
        #[arg(long)]
        instant_only: bool,

        /// Also list the number of cities in each state
        #[arg(long)]
        by_state: bool,
    },

    /// List the known state codes and names
    States,

    /// Read queries from stdin, one per line, and print debounced updates
    Interactive {
        /// Restrict to one state, by code or name
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Print an example config file
    Config,
}
