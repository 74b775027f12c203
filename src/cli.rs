use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run the response rewrite pipeline over saved payloads
#[derive(Parser)]
#[command(name = "reshelf")]
#[command(about = "Rewrite saved content-service responses and inspect the heuristics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a saved response and print the result
    Rewrite {
        /// Response file (JSON)
        file: PathBuf,

        /// Settings file (.toml or .json). Defaults to the user config location.
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Location the response was fetched for
        #[arg(short, long, default_value = "https://www.youtube.com/tv#/")]
        url: String,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,

        /// How long to wait for DeArrow results before printing (ms)
        #[arg(long, value_name = "N", default_value_t = 1500)]
        settle_ms: u64,
    },
    /// Print the navigation context of a URL
    Classify {
        url: String,
    },
    /// Print the watch progress of an item fixture
    Progress {
        file: PathBuf,
    },
}
