//! Mandate lifecycle manager
//!
//! Flow for `ensure_valid`:
//! 1. Read the cached record for the subject
//! 2. Ask the renewal policy whether it can be reused
//! 3. Reuse: return the cached token, no network call
//! 4. Renew: join the subject's in-flight call or start one
//! 5. The flight calls the authority, validates the record, writes the cache
//!    (a newly issued record must also pass the policy)
//! 6. On failure the cache is left as it was and every waiter gets the error
//!
//! Flights run on their own tokio task, so a caller that gives up waiting
//! does not cancel the call for anyone else. The task is spawned only after
//! the flight map entry has been released.

mod flight;
mod stats;

use self::flight::{Flight, FlightGuard, FlightKind, FlightMap, FlightResult};
pub use self::stats::LifecycleStats;
use self::stats::LifecycleCounters;
use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;
use crate::errors::LifecycleError;
use crate::policy::{Decision, RenewReason, RenewalPolicy};
use crate::store::MandateCache;
use agentpay_core::{IssuanceParams, MandateRecord, RemoteMandateAuthority};
use agentpay_utils::redact_token;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// The authority call a flight performs
enum Operation {
    Issue(IssuanceParams),
    Verify(String),
}

impl Operation {
    fn kind(&self) -> FlightKind {
        match self {
            Self::Issue(_) => FlightKind::Issue,
            Self::Verify(_) => FlightKind::Verify,
        }
    }
}

/// Result of trying to start a renewal
enum Begin {
    /// Another flight refreshed the cache in the meantime
    Fresh(MandateRecord),
    /// Wait on this flight
    Flight(Flight),
}

/// Hands out valid mandate tokens, renewing them against the authority
/// exactly when the policy says so.
pub struct MandateLifecycleManager {
    authority: Arc<dyn RemoteMandateAuthority>,
    cache: Arc<MandateCache>,
    clock: Arc<dyn Clock>,
    flights: Arc<FlightMap>,
    counters: Arc<LifecycleCounters>,
    config: LifecycleConfig,
}

impl MandateLifecycleManager {
    /// Create a manager with an empty cache and the system clock
    pub fn new(authority: Arc<dyn RemoteMandateAuthority>, config: LifecycleConfig) -> Self {
        Self {
            authority,
            cache: Arc::new(MandateCache::new()),
            clock: Arc::new(SystemClock),
            flights: Arc::new(FlightMap::default()),
            counters: Arc::new(LifecycleCounters::default()),
            config,
        }
    }

    /// Use a different time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use an existing cache, e.g. one shared with diagnostics
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<MandateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MandateCache> {
        &self.cache
    }

    pub fn stats(&self) -> LifecycleStats {
        self.counters.snapshot()
    }

    /// The cached record for `subject`, usable or not. Never issues.
    pub fn current(&self, subject: &str) -> Option<MandateRecord> {
        self.cache.get(subject)
    }

    /// What `ensure_valid` would do for `subject` right now
    pub fn decide(&self, subject: &str) -> Decision {
        let cached = self.cache.get(subject);
        self.config.policy.decide(cached.as_ref(), self.clock.now())
    }

    /// Whether an authority call is outstanding for `subject`
    pub fn is_in_flight(&self, subject: &str) -> bool {
        self.flights.contains(subject)
    }

    /// Number of subjects with an outstanding authority call
    pub fn in_flight_count(&self) -> usize {
        self.flights.len()
    }

    /// Drop the cached record so the next `ensure_valid` issues a new one
    pub fn invalidate(&self, subject: &str) -> Option<MandateRecord> {
        let removed = self.cache.remove(subject);
        if removed.is_some() {
            info!(subject, "cached mandate invalidated");
        }
        removed
    }

    /// `ensure_valid` for the configured subject and issuance defaults
    pub async fn ensure_default(&self) -> Result<String, LifecycleError> {
        self.ensure_valid(&self.config.subject, &self.config.params)
            .await
    }

    /// Return a token for `subject` that is neither expired nor exhausted,
    /// issuing a new mandate only when the policy requires it.
    pub async fn ensure_valid(
        &self,
        subject: &str,
        params: &IssuanceParams,
    ) -> Result<String, LifecycleError> {
        loop {
            let cached = self.cache.get(subject);
            let decision = self.config.policy.decide(cached.as_ref(), self.clock.now());
            let reason = match (decision, cached) {
                (Decision::Reuse, Some(record)) => {
                    LifecycleCounters::bump(&self.counters.reused);
                    debug!(
                        subject,
                        budget_remaining = %record.budget_remaining(),
                        "reusing cached mandate"
                    );
                    return Ok(record.token().to_string());
                }
                (Decision::Renew(reason), _) => reason,
                (Decision::Reuse, None) => RenewReason::Missing,
            };

            let flight = match self.begin_issue(subject, params, reason) {
                Begin::Fresh(record) => return Ok(record.token().to_string()),
                Begin::Flight(flight) => flight,
            };

            let outcome = flight.result.await;
            if flight.kind == FlightKind::Issue {
                return outcome.map(|record| record.token().to_string());
            }

            // A verify flight answered; serve it only if it is still usable.
            if let Ok(record) = outcome {
                if self
                    .config
                    .policy
                    .decide(Some(&record), self.clock.now())
                    .is_reuse()
                {
                    return Ok(record.token().to_string());
                }
            }
            debug!(subject, "verified mandate not usable, renewing");
        }
    }

    /// Re-verify the cached token to observe server-side budget changes.
    ///
    /// Shares the subject's flight with any issuance already in progress.
    pub async fn refresh(&self, subject: &str) -> Result<MandateRecord, LifecycleError> {
        let (flight, task) = match self.flights.entry(subject) {
            Entry::Occupied(entry) => {
                LifecycleCounters::bump(&self.counters.flights_joined);
                debug!(subject, "joining in-flight mandate call");
                (entry.get().clone(), None)
            }
            Entry::Vacant(entry) => {
                let cached = self
                    .cache
                    .get(subject)
                    .ok_or_else(|| LifecycleError::NoMandate {
                        subject: subject.to_string(),
                    })?;
                let (flight, task) =
                    self.prepare(subject, Operation::Verify(cached.token().to_string()));
                entry.insert(flight.clone());
                (flight, Some(task))
            }
        };
        if let Some(task) = task {
            task.start();
        }
        flight.result.await
    }

    fn begin_issue(
        &self,
        subject: &str,
        params: &IssuanceParams,
        reason: RenewReason,
    ) -> Begin {
        let (flight, task) = match self.flights.entry(subject) {
            Entry::Occupied(entry) => {
                LifecycleCounters::bump(&self.counters.flights_joined);
                debug!(subject, "joining in-flight mandate call");
                return Begin::Flight(entry.get().clone());
            }
            Entry::Vacant(entry) => {
                // A flight may have finished between the first read and now.
                let cached = self.cache.get(subject);
                let decision = self.config.policy.decide(cached.as_ref(), self.clock.now());
                if let (Decision::Reuse, Some(record)) = (decision, cached) {
                    LifecycleCounters::bump(&self.counters.reused);
                    debug!(subject, "mandate renewed by another caller, reusing");
                    return Begin::Fresh(record);
                }
                info!(subject, reason = %reason, "mandate renewal required");
                let (flight, task) = self.prepare(subject, Operation::Issue(params.clone()));
                entry.insert(flight.clone());
                (flight, task)
            }
        };
        task.start();
        Begin::Flight(flight)
    }

    /// Build the flight that goes into the subject's vacant entry, plus the
    /// task that resolves it. The task is started only after the entry is
    /// released, since its guard removes the entry from the same shard.
    fn prepare(&self, subject: &str, operation: Operation) -> (Flight, FlightTask) {
        let id = self.flights.next_id();
        let kind = operation.kind();
        let (sender, receiver) = oneshot::channel();

        let abort_subject = subject.to_string();
        let result = async move {
            receiver.await.unwrap_or_else(|_| {
                Err(LifecycleError::Aborted {
                    subject: abort_subject,
                    message: "flight task dropped before completing".to_string(),
                })
            })
        }
        .boxed()
        .shared();

        let task = FlightTask {
            guard: FlightGuard::new(Arc::clone(&self.flights), subject, id),
            sender,
            authority: Arc::clone(&self.authority),
            cache: Arc::clone(&self.cache),
            clock: Arc::clone(&self.clock),
            counters: Arc::clone(&self.counters),
            policy: self.config.policy,
            subject: subject.to_string(),
            operation,
        };
        (Flight { id, kind, result }, task)
    }
}

/// The detached half of a flight: performs the authority call and hands the
/// outcome to every waiter.
struct FlightTask {
    guard: FlightGuard,
    sender: oneshot::Sender<FlightResult>,
    authority: Arc<dyn RemoteMandateAuthority>,
    cache: Arc<MandateCache>,
    clock: Arc<dyn Clock>,
    counters: Arc<LifecycleCounters>,
    policy: RenewalPolicy,
    subject: String,
    operation: Operation,
}

impl FlightTask {
    fn start(self) {
        LifecycleCounters::bump(&self.counters.flights_started);
        tokio::spawn(self.run());
    }

    async fn run(self) {
        let result = AssertUnwindSafe(self.call())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(LifecycleError::Aborted {
                    subject: self.subject.clone(),
                    message: panic_message(panic.as_ref()),
                })
            });
        if result.is_err() {
            LifecycleCounters::bump(&self.counters.failures);
        }

        // Clear the map entry first so callers woken by the result can start anew.
        let Self { guard, sender, .. } = self;
        drop(guard);
        let _ = sender.send(result);
    }

    async fn call(&self) -> FlightResult {
        let subject = self.subject.as_str();
        let outcome = match &self.operation {
            Operation::Issue(params) => {
                info!(
                    subject,
                    budget = %params.budget,
                    scope = %params.scope,
                    ttl_minutes = params.ttl_minutes(),
                    "issuing mandate"
                );
                self.authority
                    .issue(subject, params.budget, &params.scope, params.ttl)
                    .await
            }
            Operation::Verify(token) => {
                info!(subject, token = %redact_token(token), "verifying cached mandate");
                self.authority.verify(token).await
            }
        };

        let record = match outcome {
            Ok(record) => record,
            Err(source) => {
                warn!(subject, error = %source, "mandate call failed, cache unchanged");
                return Err(LifecycleError::authority(subject, source));
            }
        };

        if let Err(e) = accept(subject, &record) {
            warn!(subject, error = %e, "authority returned an invalid mandate, not caching");
            return Err(e);
        }

        // A verified record may legitimately be spent down; a new one must be usable.
        if let Operation::Issue(_) = self.operation {
            if let Decision::Renew(reason) = self.policy.decide(Some(&record), self.clock.now()) {
                warn!(subject, reason = %reason, "newly issued mandate is not usable, not caching");
                return Err(LifecycleError::invalid_record(
                    subject,
                    format!("newly issued mandate is not usable ({reason})"),
                ));
            }
        }

        self.cache.set(record.clone());
        info!(
            subject,
            token = %redact_token(record.token()),
            budget_remaining = %record.budget_remaining(),
            expires_at = %record.expires_at().to_rfc3339(),
            "mandate cached"
        );
        Ok(record)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "flight task panicked".to_string()
    }
}

/// Fail closed on records that break their invariants or name another subject
fn accept(subject: &str, record: &MandateRecord) -> Result<(), LifecycleError> {
    record
        .validate()
        .map_err(|e| LifecycleError::invalid_record(subject, e.to_string()))?;
    if record.subject() != subject {
        return Err(LifecycleError::invalid_record(
            subject,
            format!("mandate was issued for '{}'", record.subject()),
        ));
    }
    Ok(())
}
