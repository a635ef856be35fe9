//! Command-line interface for agridash.
//!
//! This module provides the CLI structure for the `agridash` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ChartsCommand, ConfigCommand, ListCommand, ServeCommand, SubmitCommand};

/// agridash - Record agricultural field observations
///
/// Runs the observation server and drives its dashboard from the terminal:
/// submit observations, list them, project them into charts, and watch new
/// ones arrive live.
#[derive(Debug, Parser)]
#[command(name = "agridash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the observation server
    Serve(ServeCommand),

    /// Submit one observation
    Submit(SubmitCommand),

    /// List stored observations
    List(ListCommand),

    /// Show the chart projections of stored observations
    Charts(ChartsCommand),

    /// Follow the dashboard live until Ctrl-C
    Watch,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
