//! Write-then-notify ingestion.
//!
//! A submission is first made durable in the record store and only then
//! handed to the notification channel. The store is the source of truth: a
//! reader of the listing endpoint is always eventually consistent with it no
//! matter what the channel delivered, and a record that failed to store is
//! never broadcast.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::notify::Broadcaster;
use crate::observation::{NewObservation, Observation};
use crate::storage::RecordStore;

/// Couples the record store with the notification channel.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn RecordStore>,
    broadcaster: Broadcaster,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Create an ingestor over a store and a broadcaster.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Store a submission, then broadcast the stored record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for incomplete submissions or a storage
    /// error if the write fails. Nothing is broadcast in either case.
    pub async fn ingest(&self, new: NewObservation) -> Result<Observation> {
        let stored = match self.store.insert(new).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Observation rejected");
                return Err(err);
            }
        };

        let receivers = self.broadcaster.broadcast(stored.clone());
        info!(id = stored.id, receivers, "Observation stored");
        Ok(stored)
    }

    /// Read every stored observation.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<Observation>> {
        self.store.list_all().await
    }

    /// The notification channel new records are published on.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}
