//! Live dashboard session.
//!
//! A [`Dashboard`] owns the current [`DashboardState`] behind a watch
//! channel. [`Dashboard::start`] connects the event stream first and then
//! fetches the listing, so nothing stored in between is missed; records seen
//! through both paths are merged by id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::{ApiClient, EventStream};
use super::state::DashboardState;
use crate::config::Config;
use crate::error::Result;
use crate::observation::{Observation, ObservationField};

/// Client-side view of the server, updated as records arrive.
#[derive(Debug, Clone)]
pub struct Dashboard {
    client: ApiClient,
    reconnect_delay: Duration,
    state: Arc<watch::Sender<DashboardState>>,
}

/// The background task following the event stream. Dropping it stops the
/// task.
#[derive(Debug)]
pub struct LiveFeed {
    task: JoinHandle<()>,
}

impl LiveFeed {
    /// Stop following the event stream.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Dashboard {
    /// Create a dashboard over a client.
    #[must_use]
    pub fn new(client: ApiClient, reconnect_delay: Duration) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            client,
            reconnect_delay,
            state: Arc::new(state),
        }
    }

    /// Create a dashboard from the `client` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ApiClient::from_config(config)?,
            config.reconnect_delay(),
        ))
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Receive every future snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Connect the event stream, then load the listing.
    ///
    /// A failed first connection or listing is logged and retried in the
    /// background; the returned feed keeps running until dropped.
    pub async fn start(&self) -> LiveFeed {
        let first = match self.client.subscribe().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "Event stream unavailable; will retry");
                None
            }
        };
        let loaded = self.refresh().await.is_ok();

        let task = tokio::spawn(self.clone().follow(first, loaded));
        LiveFeed { task }
    }

    /// Fetch the full listing and merge it into the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched; the state is left
    /// unchanged.
    pub async fn refresh(&self) -> Result<()> {
        match self.client.list().await {
            Ok(listing) => {
                info!(count = listing.len(), "Loaded observations");
                self.state.send_modify(|s| *s = s.with_listing(listing));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load observations");
                Err(e)
            }
        }
    }

    /// Fold in a record pushed by the server.
    pub fn receive(&self, observation: Observation) {
        debug!(id = observation.id, "Observation received");
        self.state.send_modify(|s| *s = s.with_received(observation));
    }

    /// Edit one form input.
    pub fn set_field(&self, field: ObservationField, value: impl Into<String>) {
        let value = value.into();
        self.state
            .send_modify(|s| *s = s.with_form_field(field, value));
    }

    /// Submit the current form.
    ///
    /// On success the form is cleared and a success alert shown; the stored
    /// record reaches the record list through the event stream. On failure
    /// the form is kept and an error alert shown.
    ///
    /// # Errors
    ///
    /// Returns the error from the server or the transport.
    pub async fn submit(&self) -> Result<Observation> {
        let submission = self.state.borrow().form().to_submission();
        match self.client.submit(&submission).await {
            Ok(stored) => {
                info!(id = stored.id, "Observation submitted");
                self.state.send_modify(|s| *s = s.with_submit_success());
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "Submission failed");
                self.state.send_modify(|s| *s = s.with_submit_failure());
                Err(e)
            }
        }
    }

    async fn follow(self, mut first: Option<EventStream>, mut loaded: bool) {
        loop {
            let mut stream = match first.take() {
                Some(stream) => stream,
                None => match self.client.subscribe().await {
                    Ok(stream) => {
                        info!("Event stream reconnected");
                        // Catch up on anything stored while disconnected.
                        loaded = self.refresh().await.is_ok();
                        stream
                    }
                    Err(e) => {
                        debug!(error = %e, "Reconnect failed");
                        tokio::time::sleep(self.reconnect_delay).await;
                        continue;
                    }
                },
            };

            if !loaded {
                loaded = self.refresh().await.is_ok();
            }

            loop {
                match stream.next().await {
                    Ok(Some(observation)) => self.receive(observation),
                    Ok(None) => {
                        warn!("Event stream closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Event stream lost");
                        break;
                    }
                }
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}
