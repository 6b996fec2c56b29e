//! Per-call aggregation record for an outstanding batch.

use crate::error::{Error, Result};

/// Lifecycle of a pending batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Record exists, no member dispatched yet.
    Created,
    /// Members dispatched, `0 <= received < expected`.
    Collecting,
    /// Every slot written; results not yet handed out.
    Complete,
    /// Results handed out; record is inert.
    Discarded,
}

/// Positional results container for one batch call.
///
/// Only the collecting loop writes to a record, so it carries no lock.
#[derive(Debug)]
pub struct PendingBatch<T> {
    id: u64,
    slots: Vec<Option<T>>,
    received: usize,
    state: BatchState,
}

impl<T> PendingBatch<T> {
    /// Creates a record expecting `expected` responses.
    pub fn new(id: u64, expected: usize) -> Self {
        let mut slots = Vec::with_capacity(expected);
        slots.resize_with(expected, || None);
        Self { id, slots, received: 0, state: BatchState::Created }
    }

    /// Marks the members as dispatched.
    pub fn start(&mut self) {
        if self.state == BatchState::Created {
            self.state = BatchState::Collecting;
        }
    }

    /// Stores the response for `position`.
    ///
    /// Returns `Ok(true)` when this response completed the batch. Writes to a
    /// filled slot, an out-of-range slot, or a record that is not collecting
    /// are rejected without touching state.
    pub fn record(&mut self, position: usize, value: T) -> Result<bool> {
        let late = Error::LateResponse { batch: self.id, position };

        if self.state != BatchState::Collecting {
            return Err(late);
        }

        let Some(slot) = self.slots.get_mut(position) else {
            return Err(late);
        };
        if slot.is_some() {
            return Err(late);
        }

        *slot = Some(value);
        self.received += 1;

        if self.received == self.slots.len() {
            self.state = BatchState::Complete;
            return Ok(true);
        }
        Ok(false)
    }

    /// Hands out the ordered results and discards the record.
    pub fn take(&mut self) -> Result<Vec<T>> {
        let incomplete =
            Error::Incomplete { batch: self.id, received: self.received, expected: self.slots.len() };

        if self.state != BatchState::Complete {
            return Err(incomplete);
        }

        self.state = BatchState::Discarded;
        std::mem::take(&mut self.slots).into_iter().collect::<Option<Vec<T>>>().ok_or(incomplete)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn state(&self) -> BatchState {
        self.state
    }
}
