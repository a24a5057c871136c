//! Shared fixtures for lifecycle tests

#![allow(dead_code)]

use agentpay_cache::{Clock, LifecycleConfig, ManualClock, MandateLifecycleManager, RenewalPolicy};
use agentpay_core::{
    Amount, AuthorityError, IssuanceParams, MandateEnvelope, MandateRecord,
    RemoteMandateAuthority,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap()
}

pub fn default_params() -> IssuanceParams {
    IssuanceParams::new(Amount::from_dollars(100), "*", Duration::minutes(1440)).unwrap()
}

/// In-memory authority with knobs for failure, corruption, and gating.
pub struct FakeAuthority {
    clock: Arc<ManualClock>,
    issue_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    issued: Mutex<HashMap<String, MandateRecord>>,
    spent: Mutex<HashMap<String, Amount>>,
    failure: Mutex<Option<AuthorityError>>,
    gated: Mutex<HashSet<String>>,
    gate: Semaphore,
    corrupt: AtomicBool,
    panic_on_issue: AtomicBool,
    subject_override: Mutex<Option<String>>,
}

impl FakeAuthority {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            issue_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            issued: Mutex::new(HashMap::new()),
            spent: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            gated: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            corrupt: AtomicBool::new(false),
            panic_on_issue: AtomicBool::new(false),
            subject_override: Mutex::new(None),
        }
    }

    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Fail every subsequent call with `error`, or stop failing with `None`
    pub fn fail_with(&self, error: Option<AuthorityError>) {
        *self.failure.lock() = error;
    }

    /// Hold issuance for `subject` until `release` is called
    pub fn gate_subject(&self, subject: &str) {
        self.gated.lock().insert(subject.to_string());
    }

    /// Let `n` gated issuances through
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Return records with `budget_remaining > budget_total`
    pub fn corrupt_records(&self, on: bool) {
        self.corrupt.store(on, Ordering::SeqCst);
    }

    pub fn panic_on_issue(&self, on: bool) {
        self.panic_on_issue.store(on, Ordering::SeqCst);
    }

    /// Issue records for a different subject than requested
    pub fn issue_for(&self, subject: Option<&str>) {
        *self.subject_override.lock() = subject.map(str::to_string);
    }

    /// Record server-side spending against `token`
    pub fn spend(&self, token: &str, amount: Amount) {
        let mut spent = self.spent.lock();
        let entry = spent.entry(token.to_string()).or_insert(Amount::ZERO);
        *entry = Amount::new(entry.as_decimal() + amount.as_decimal()).unwrap();
    }
}

#[async_trait]
impl RemoteMandateAuthority for FakeAuthority {
    async fn issue(
        &self,
        subject: &str,
        budget: Amount,
        scope: &str,
        ttl: Duration,
    ) -> Result<MandateRecord, AuthorityError> {
        let n = self.issue_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let gated = self.gated.lock().contains(subject);
        if gated {
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();
        }

        if self.panic_on_issue.load(Ordering::SeqCst) {
            panic!("authority exploded");
        }

        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let issued_at = self.clock.now();
        let remaining = if self.corrupt.load(Ordering::SeqCst) {
            Amount::new(budget.as_decimal() + Amount::from_dollars(1).as_decimal()).unwrap()
        } else {
            budget
        };
        let record_subject = self
            .subject_override
            .lock()
            .clone()
            .unwrap_or_else(|| subject.to_string());

        let record = MandateRecord::new_unchecked(
            format!("mandate-{subject}-{n}"),
            MandateEnvelope {
                subject: record_subject,
                scope: scope.to_string(),
                budget_total: budget,
                budget_remaining: remaining,
                issued_at,
                expires_at: issued_at + ttl,
            },
        );
        self.issued
            .lock()
            .insert(record.token().to_string(), record.clone());
        Ok(record)
    }

    async fn verify(&self, token: &str) -> Result<MandateRecord, AuthorityError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let original = self
            .issued
            .lock()
            .get(token)
            .cloned()
            .ok_or_else(|| AuthorityError::invalid_token("unknown token"))?;
        let spent = self
            .spent
            .lock()
            .get(token)
            .copied()
            .unwrap_or(Amount::ZERO);

        let mut envelope = original.envelope().clone();
        envelope.budget_remaining = envelope
            .budget_total
            .checked_sub(spent)
            .unwrap_or(Amount::ZERO);
        Ok(MandateRecord::new_unchecked(token, envelope))
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub authority: Arc<FakeAuthority>,
    pub manager: Arc<MandateLifecycleManager>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RenewalPolicy::new(Amount::from_cents(1)))
    }

    pub fn with_policy(policy: RenewalPolicy) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let authority = Arc::new(FakeAuthority::new(Arc::clone(&clock)));
        let config = LifecycleConfig::new("agent-1", default_params(), policy);
        let manager = MandateLifecycleManager::new(
            Arc::clone(&authority) as Arc<dyn RemoteMandateAuthority>,
            config,
        )
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        Self {
            clock,
            authority,
            manager: Arc::new(manager),
        }
    }
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while !condition() {
        assert!(
            std::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}
