//! Command-line interface definitions for solipull.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options can also be provided through environment variables.

use clap::{Parser, Subcommand};

/// Command-line arguments for solipull.
///
/// # Examples
///
/// ```sh
/// # Scrape March solicitations for DC and Marvel
/// solipull sync -m march -p dc,marvel
///
/// # Use a custom config and store location
/// solipull --config ./solipull.yaml --store ./data sync -m march -m april -p image
///
/// # Print what has been saved so far
/// solipull list
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "SOLIPULL_CONFIG")]
    pub config: Option<String>,

    /// Directory holding the solicitation store
    #[arg(short, long, global = true, env = "SOLIPULL_STORE", default_value = "./data")]
    pub store: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Scrape solicitations and save them to the store
    Sync {
        /// Month to scrape; repeat the flag or separate values with commas
        #[arg(short = 'm', long = "month", required = true)]
        months: Vec<String>,

        /// Publisher to scrape (dc, marvel, image); repeatable
        #[arg(short = 'p', long = "publisher", required = true)]
        publishers: Vec<String>,
    },

    /// Print stored solicitations ordered by release date
    List {
        /// Only show this publisher
        #[arg(short = 'p', long)]
        publisher: Option<String>,
    },
}
