//! HTTP client for the agridash API.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Response;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use super::sse::{SseDecoder, SseEvent};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::notify::NEW_DATA_EVENT;
use crate::observation::{NewObservation, Observation};
use crate::server::{ErrorPayload, DATA_PATH, EVENTS_PATH};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

/// Client for the observation endpoints and the event stream.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    // No overall timeout: the event stream stays open indefinitely.
    stream_http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    ///
    /// `request_timeout` bounds list and submit calls, and the connect phase
    /// of the event stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        let stream_http = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            stream_http,
            base_url,
        })
    }

    /// Create a client from the `client` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.client.base_url.clone(), config.request_timeout())
    }

    /// The server this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetch every stored observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or answers with an
    /// error status.
    pub async fn list(&self) -> Result<Vec<Observation>> {
        let response = self.http.get(self.url(DATA_PATH)).send().await?;
        let observations: Vec<Observation> = check(response).await?.json().await?;
        debug!(count = observations.len(), "Fetched observations");
        Ok(observations)
    }

    /// Submit an observation and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with the server's message for a rejected
    /// submission, or a transport error if the server is unreachable.
    pub async fn submit(&self, new: &NewObservation) -> Result<Observation> {
        let response = self.http.post(self.url(DATA_PATH)).json(new).send().await?;
        let stored: Observation = check(response).await?.json().await?;
        debug!(id = stored.id, "Submitted observation");
        Ok(stored)
    }

    /// Open the event stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn subscribe(&self) -> Result<EventStream> {
        let response = self
            .stream_http
            .get(self.url(EVENTS_PATH))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check(response).await?;
        debug!(url = %self.url(EVENTS_PATH), "Event stream connected");
        Ok(EventStream::new(response))
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorPayload>(&body) {
        Ok(payload) => payload.error.message,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body,
    };
    warn!(status = status.as_u16(), %message, "Server returned error");
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Observations pushed over an open event stream.
pub struct EventStream {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    fn new(response: Response) -> Self {
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()));
        Self {
            bytes: Box::pin(bytes),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Wait for the next pushed observation.
    ///
    /// Returns `Ok(None)` once the server closes the stream. Events with
    /// another name or an unreadable payload are skipped.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the stream breaks.
    pub async fn next(&mut self) -> Result<Option<Observation>> {
        loop {
            while let Some(event) = self.pending.pop_front() {
                if event.event != NEW_DATA_EVENT {
                    debug!(event = %event.event, "Ignoring event");
                    continue;
                }
                match serde_json::from_str::<Observation>(&event.data) {
                    Ok(observation) => return Ok(Some(observation)),
                    Err(e) => warn!(error = %e, "Skipping unreadable event payload"),
                }
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.push(&chunk)),
                Some(Err(e)) => {
                    return Err(Error::connection(format!("event stream interrupted: {e}")))
                }
                None => return Ok(None),
            }
        }
    }
}
