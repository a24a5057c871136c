//! Per-subject single-flight bookkeeping
//!
//! The first caller that needs the authority for a subject inserts a shared
//! pending result here; later callers for the same subject clone it instead
//! of starting a second call. The entry is removed by the flight itself.

use crate::errors::LifecycleError;
use agentpay_core::MandateRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) type FlightResult = Result<MandateRecord, LifecycleError>;
pub(crate) type SharedResult = Shared<BoxFuture<'static, FlightResult>>;

/// What the flight asked the authority for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlightKind {
    Issue,
    Verify,
}

/// One outstanding authority call
#[derive(Clone)]
pub(crate) struct Flight {
    pub id: u64,
    pub kind: FlightKind,
    pub result: SharedResult,
}

/// Outstanding flights keyed by subject
#[derive(Default)]
pub(crate) struct FlightMap {
    flights: DashMap<String, Flight>,
    next_id: AtomicU64,
}

impl FlightMap {
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn entry(&self, subject: &str) -> Entry<'_, String, Flight> {
        self.flights.entry(subject.to_string())
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.flights.contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Remove the entry for `subject` only if it still belongs to flight `id`
    fn finish(&self, subject: &str, id: u64) {
        self.flights.remove_if(subject, |_, flight| flight.id == id);
    }
}

/// Clears a flight's map entry when the flight task ends, panics included.
pub(crate) struct FlightGuard {
    flights: Arc<FlightMap>,
    subject: String,
    id: u64,
}

impl FlightGuard {
    pub fn new(flights: Arc<FlightMap>, subject: impl Into<String>, id: u64) -> Self {
        Self {
            flights,
            subject: subject.into(),
            id,
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flights.finish(&self.subject, self.id);
    }
}
