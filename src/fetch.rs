//! Resilient JSON fetching across the relay table.
//!
//! A [`FetchClient`] races one attempt per relay for a target URL and takes
//! the first success. The relay that last succeeded is remembered in a
//! session-scoped rotation index and listed first on the next call, so the
//! fastest healthy relay tends to keep winning. Individual attempt failures
//! are logged and swallowed; only total exhaustion surfaces to the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::select_ok;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::relay::{default_relays, RelayDescriptor};

/// Per-relay attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(8);

/// Relay-racing JSON fetcher with session-scoped rotation state.
pub struct FetchClient {
    client: reqwest::Client,
    relays: Vec<RelayDescriptor>,
    rotation: AtomicUsize,
    attempt_timeout: Duration,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    pub fn new() -> Self {
        Self::with_relays(default_relays(), DEFAULT_ATTEMPT_TIMEOUT)
    }

    /// Build a client over a custom relay table, mainly for tests and for
    /// overriding the attempt timeout.
    pub fn with_relays(relays: Vec<RelayDescriptor>, attempt_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            relays,
            rotation: AtomicUsize::new(0),
            attempt_timeout,
        }
    }

    /// Index of the relay attempted first on the next fetch.
    pub fn preferred_relay(&self) -> usize {
        self.rotation.load(Ordering::Relaxed)
    }

    /// Fetch `target` through the relays, returning the first successfully
    /// unwrapped JSON payload.
    ///
    /// Every relay is attempted exactly once, all concurrently; the attempt
    /// order starts at the rotation index and wraps around, which breaks
    /// completion-order ties in favor of the last winner. On success the
    /// rotation index moves to the winning relay. If every attempt fails
    /// the rotation index is left untouched and the last observed error is
    /// wrapped in [`FetchError::AllRelaysFailed`].
    pub async fn fetch_json(&self, target: &str) -> Result<Value> {
        if self.relays.is_empty() {
            return Err(FetchError::Network("no relays configured".to_string()));
        }

        let start = self.preferred_relay() % self.relays.len();
        let attempts: Vec<_> = (0..self.relays.len())
            .map(|offset| (start + offset) % self.relays.len())
            .map(|idx| self.attempt(idx, target).boxed())
            .collect();

        match select_ok(attempts).await {
            Ok(((winner, payload), _slower)) => {
                self.rotation.store(winner, Ordering::Relaxed);
                Ok(payload)
            }
            Err(last) => Err(FetchError::AllRelaysFailed(Box::new(last))),
        }
    }

    async fn attempt(&self, idx: usize, target: &str) -> Result<(usize, Value)> {
        let relay = &self.relays[idx];
        match tokio::time::timeout(self.attempt_timeout, self.request(relay, target)).await {
            Ok(Ok(payload)) => {
                debug!(relay = relay.name.as_str(), target, "relay attempt succeeded");
                Ok((idx, payload))
            }
            Ok(Err(err)) => {
                debug!(relay = relay.name.as_str(), %err, "relay attempt failed");
                Err(err)
            }
            Err(_) => {
                let err = FetchError::Network(format!(
                    "{} timed out after {:?}",
                    relay.name, self.attempt_timeout
                ));
                debug!(relay = relay.name.as_str(), %err, "relay attempt timed out");
                Err(err)
            }
        }
    }

    async fn request(&self, relay: &RelayDescriptor, target: &str) -> Result<Value> {
        let url = relay.request_url(target)?;
        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = resp.text().await?;
        relay.unwrap_response(&body)
    }
}
