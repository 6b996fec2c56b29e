//! Fan-out/fan-in of per-identifier lookups.
//!
//! A batch issues one request per identifier, tags every response with the
//! identifier's position and delivers the ordered results once all of them
//! have arrived. A single identifier bypasses aggregation and is delivered
//! bare.

mod delivery;
mod pending;

pub use delivery::Delivery;
pub use pending::{BatchState, PendingBatch};

use crate::error::{Error, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Identifier of one outstanding batch call.
pub type BatchId = u64;

/// Limits applied to every batch run by an aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Per-member timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum members in flight per batch. `None` dispatches all at once.
    pub max_concurrency: Option<usize>,
}

/// Issues batched lookups and re-aggregates their results in input order.
pub struct BatchAggregator {
    options: BatchOptions,
    next_id: AtomicU64,
    registry: Mutex<HashMap<BatchId, CancellationToken>>,
}

impl BatchAggregator {
    /// Creates an aggregator with the given limits.
    pub fn new(options: BatchOptions) -> Self {
        Self { options, next_id: AtomicU64::new(0), registry: Mutex::new(HashMap::new()) }
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    /// Looks up every identifier, failing the whole batch on the first error.
    pub async fn run<I, T, F, Fut>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
    ) -> Result<Delivery<T>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with_cancel(ids, fetch_one, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), ending early with `Cancelled` once `cancel` fires.
    pub async fn run_with_cancel<I, T, F, Fut>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
        cancel: &CancellationToken,
    ) -> Result<Delivery<T>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.dispatch(ids, fetch_one, cancel, true).await? {
            Delivery::One(outcome) => outcome.map(Delivery::One),
            Delivery::Many(slots) => slots.into_iter().collect::<Result<Vec<T>>>().map(Delivery::Many),
        }
    }

    /// Looks up every identifier and waits for all of them, marking failed slots.
    pub async fn settle<I, T, F, Fut>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
    ) -> Result<Delivery<Result<T>>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.settle_with_cancel(ids, fetch_one, &CancellationToken::new()).await
    }

    /// Like [`settle`](Self::settle), ending early with `Cancelled` once `cancel` fires.
    pub async fn settle_with_cancel<I, T, F, Fut>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
        cancel: &CancellationToken,
    ) -> Result<Delivery<Result<T>>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.dispatch(ids, fetch_one, cancel, false).await
    }

    /// Runs a fail-fast batch and reports its outcome to `on_done` exactly once.
    pub async fn run_then<I, T, F, Fut, D>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
        on_done: D,
    ) where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
        D: FnOnce(Result<Delivery<T>>),
    {
        on_done(self.run(ids, fetch_one).await);
    }

    /// Cancels every batch currently running. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        for token in registry.values() {
            token.cancel();
        }
        registry.len()
    }

    /// Number of batches currently running, single-identifier lookups included.
    pub fn in_flight(&self) -> usize {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn dispatch<I, T, F, Fut>(
        &self,
        ids: impl IntoIterator<Item = I>,
        fetch_one: F,
        cancel: &CancellationToken,
        fail_fast: bool,
    ) -> Result<Delivery<Result<T>>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut ids: Vec<I> = ids.into_iter().collect();
        let batch = self.next_id.fetch_add(1, Ordering::Relaxed);

        match ids.len() {
            0 => Err(Error::EmptyBatch),
            1 => {
                let id = ids.remove(0);
                let label = id.to_string();
                debug!("Batch {} has a single id ({}), skipping aggregation", batch, label);

                let token = cancel.child_token();
                let _registration = Registration::new(&self.registry, batch, token.clone());

                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled { batch }),
                    outcome = bounded(label, fetch_one(id), self.options.timeout) => {
                        Ok(Delivery::One(outcome))
                    }
                }
            }
            _ => {
                let token = cancel.child_token();
                let _registration = Registration::new(&self.registry, batch, token.clone());
                self.collect(batch, ids, fetch_one, &token, fail_fast).await.map(Delivery::Many)
            }
        }
    }

    async fn collect<I, T, F, Fut>(
        &self,
        batch: BatchId,
        ids: Vec<I>,
        fetch_one: F,
        cancel: &CancellationToken,
        fail_fast: bool,
    ) -> Result<Vec<Result<T>>>
    where
        I: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let expected = ids.len();
        let window = self.options.timeout;
        let limit = self.options.max_concurrency.unwrap_or(expected).max(1);
        let mut pending = PendingBatch::new(batch, expected);

        debug!("Batch {}: dispatching {} lookups ({} in flight max)", batch, expected, limit);

        let mut arrivals = stream::iter(ids.into_iter().enumerate())
            .map(|(position, id)| {
                let label = id.to_string();
                let lookup = fetch_one(id);
                async move { (position, bounded(label, lookup, window).await) }
            })
            .buffer_unordered(limit);

        pending.start();

        while pending.state() == BatchState::Collecting {
            let arrival = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Batch {} cancelled with {}/{} responses", batch, pending.received(), expected);
                    return Err(Error::Cancelled { batch });
                }
                arrival = arrivals.next() => arrival,
            };

            let Some((position, outcome)) = arrival else {
                break;
            };

            let outcome = match outcome {
                Err(err) if fail_fast => {
                    warn!("Batch {} member #{} failed: {}", batch, position, err);
                    return Err(Error::BatchMember { position, source: Box::new(err) });
                }
                outcome => outcome,
            };

            if let Err(err) = pending.record(position, outcome) {
                warn!("Dropping response: {}", err);
            }
        }

        debug!("Batch {} complete", batch);
        pending.take()
    }
}

impl Default for BatchAggregator {
    fn default() -> Self {
        Self::new(BatchOptions::default())
    }
}

/// Registry entry that removes itself on every exit path.
struct Registration<'a> {
    registry: &'a Mutex<HashMap<BatchId, CancellationToken>>,
    id: BatchId,
}

impl<'a> Registration<'a> {
    fn new(
        registry: &'a Mutex<HashMap<BatchId, CancellationToken>>,
        id: BatchId,
        token: CancellationToken,
    ) -> Self {
        registry.lock().unwrap_or_else(|e| e.into_inner()).insert(id, token);
        Self { registry, id }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.id);
    }
}

/// Applies the per-member timeout, mapping expiry to [`Error::Timeout`].
async fn bounded<T>(
    id: String,
    lookup: impl Future<Output = Result<T>>,
    window: Option<Duration>,
) -> Result<T> {
    let Some(window) = window else {
        return lookup.await;
    };

    match tokio::time::timeout(window, lookup).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::Timeout {
            id,
            after_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
