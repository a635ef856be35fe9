//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::Config;
use crate::observation::ObservationField;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Apply the command-line overrides to a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Soil type, e.g. "Clay"
    #[arg(long)]
    pub soil_type: String,

    /// Irrigation method, e.g. "Drip"
    #[arg(long)]
    pub irrigation_method: String,

    /// Seed type, e.g. "Hybrid"
    #[arg(long)]
    pub seed_type: String,

    /// Fertilizer used, e.g. "Organic"
    #[arg(long)]
    pub fertilizer_used: String,
}

impl SubmitCommand {
    /// The form inputs as `(field, value)` pairs.
    #[must_use]
    pub fn fields(&self) -> [(ObservationField, &str); 4] {
        [
            (ObservationField::SoilType, self.soil_type.as_str()),
            (ObservationField::IrrigationMethod, self.irrigation_method.as_str()),
            (ObservationField::SeedType, self.seed_type.as_str()),
            (ObservationField::FertilizerUsed, self.fertilizer_used.as_str()),
        ]
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Charts command arguments.
#[derive(Debug, Args)]
pub struct ChartsCommand {
    /// Output the Chart.js data and options as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}
