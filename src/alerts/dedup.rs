use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::alerts::types::Alert;

pub const DEFAULT_COOLDOWN_SECS: i64 = 3600;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Rolling history of delivered alerts, used to suppress repeats of the
/// same (symbol, kind) within the cooldown window.
///
/// Entries age out by truncation only: the newest `capacity` entries are
/// kept after each batch, so an alert pushed past the bound becomes
/// eligible to fire again even inside its cooldown. Owned by whoever runs
/// the tick; there is no global instance.
pub struct AlertHistory {
    entries: VecDeque<Alert>,
    cooldown: Duration,
    capacity: usize,
}

impl AlertHistory {
    pub fn new(cooldown: Duration, capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cooldown,
            capacity,
        }
    }

    /// Filter a candidate batch against the history, admitting what should
    /// be delivered and recording it. Output preserves input order.
    pub fn admit(&mut self, candidates: Vec<Alert>) -> Vec<Alert> {
        self.admit_at(Utc::now(), candidates)
    }

    /// Clock-explicit variant of [`admit`](Self::admit).
    ///
    /// Admitted alerts are inserted into the history immediately, so a
    /// second copy later in the same batch is suppressed too. Truncation to
    /// capacity happens once, after the whole batch.
    pub fn admit_at(&mut self, now: DateTime<Utc>, candidates: Vec<Alert>) -> Vec<Alert> {
        let mut delivered = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let is_duplicate = self.entries.iter().any(|prior| {
                prior.symbol == candidate.symbol
                    && prior.kind == candidate.kind
                    && now - prior.timestamp < self.cooldown
            });

            if !is_duplicate {
                self.entries.push_back(candidate.clone());
                delivered.push(candidate);
            }
        }

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        delivered
    }

    /// Newest-first view of the most recent `n` delivered alerts.
    pub fn recent(&self, n: usize) -> Vec<Alert> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insertion-ordered iterator over the retained history, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }
}

impl Default for AlertHistory {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_COOLDOWN_SECS),
            DEFAULT_HISTORY_CAPACITY,
        )
    }
}
