//! Fan-out of newly stored observations to connected viewers.
//!
//! Delivery is best-effort: there is no acknowledgment, no retry and no
//! replay. A viewer that connects late, or falls further behind than the
//! channel capacity, recovers missed records from the listing endpoint.

use tokio::sync::broadcast;
use tracing::debug;

use crate::observation::Observation;

/// Name of the event carrying a newly stored observation.
pub const NEW_DATA_EVENT: &str = "newData";

/// Default number of undelivered observations buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Publish side of the notification channel.
///
/// Cloning is cheap; every clone publishes to the same subscribers.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Observation>,
}

impl Broadcaster {
    /// Create a broadcaster that buffers up to `capacity` observations for
    /// a lagging subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that
    /// value before a broadcaster is built.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver an observation to every currently connected subscriber.
    ///
    /// Never blocks. Returns how many subscribers the observation was queued
    /// for; zero when nobody is listening.
    pub fn broadcast(&self, observation: Observation) -> usize {
        let id = observation.id;
        match self.sender.send(observation) {
            Ok(receivers) => {
                debug!(id, receivers, "Broadcast observation");
                receivers
            }
            Err(_) => {
                debug!(id, "No subscribers for observation");
                0
            }
        }
    }

    /// Open a new subscription. Only observations broadcast after this call
    /// are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Observation> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
