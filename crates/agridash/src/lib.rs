//! `agridash` - Agricultural observation recorder with a live dashboard
//!
//! Field workers submit observations (soil type, irrigation method, seed
//! type, fertilizer used). The server stores each one, lists them on
//! request, and pushes every new record to connected dashboards, which keep
//! a local copy and project it into charts.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod notify;
pub mod observation;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use ingest::Ingestor;
pub use logging::init_logging;
pub use notify::Broadcaster;
pub use observation::{NewObservation, Observation, ObservationField};
pub use storage::{RecordStore, SqliteStore, Storage, StorageStats};
