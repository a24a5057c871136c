//! In-memory mandate store
//!
//! Holds at most one current record per subject. Entries are replaced
//! whole, so a reader sees either the previous record or the new one.
//! The store never expires entries itself; freshness is the policy's call.

use agentpay_core::MandateRecord;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Current mandate per subject
#[derive(Debug, Default)]
pub struct MandateCache {
    entries: RwLock<HashMap<String, MandateRecord>>,
}

impl MandateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current record for `subject`
    pub fn get(&self, subject: &str) -> Option<MandateRecord> {
        self.entries.read().get(subject).cloned()
    }

    /// Make `record` current for its subject, returning the superseded one
    pub fn set(&self, record: MandateRecord) -> Option<MandateRecord> {
        let subject = record.subject().to_string();
        self.entries.write().insert(subject, record)
    }

    /// Drop the record for `subject`
    pub fn remove(&self, subject: &str) -> Option<MandateRecord> {
        self.entries.write().remove(subject)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.entries.read().contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Subjects with a cached record, sorted
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.entries.read().keys().cloned().collect();
        subjects.sort();
        subjects
    }
}
