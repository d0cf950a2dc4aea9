//! Retry Ledger: the one piece of state shared between the Engine task and
//! the Supervisor task. `DashMap` gives us lock-free per-key access, and the
//! two counters inside each entry are atomics so a concurrent read from the
//! Supervisor can never observe a torn write from the Engine.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::session::SessionKey;

pub struct RetryEntry {
    pub retry_count: AtomicU32,
    /// Unix millis of the last frame received on this session, or `0` if no
    /// frame has arrived yet. The Supervisor skips entries still at `0` —
    /// a session that hasn't connected yet isn't stalled.
    pub last_message_time: AtomicI64,
}

impl RetryEntry {
    fn new() -> Self {
        Self {
            retry_count: AtomicU32::new(0),
            last_message_time: AtomicI64::new(0),
        }
    }
}

#[derive(Clone)]
pub struct RetryLedger {
    entries: Arc<DashMap<SessionKey, Arc<RetryEntry>>>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self { entries: Arc::new(DashMap::new()) }
    }

    pub fn entry(&self, key: SessionKey) -> Arc<RetryEntry> {
        self.entries.entry(key).or_insert_with(|| Arc::new(RetryEntry::new())).clone()
    }

    /// Matches the original's linear-capped backoff: `min(retry_count, 10)`
    /// seconds, so it never degenerates into an unbounded exponential wait.
    pub fn record_failure(&self, key: SessionKey, cap: u64) -> u64 {
        let entry = self.entry(key);
        let count = entry.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
        (count as u64).min(cap)
    }

    pub fn record_success(&self, key: SessionKey) {
        let entry = self.entry(key);
        entry.retry_count.store(0, Ordering::SeqCst);
    }

    pub fn touch(&self, key: SessionKey, unix_millis: i64) {
        let entry = self.entry(key);
        entry.last_message_time.store(unix_millis, Ordering::SeqCst);
    }

    /// Returns keys whose `last_message_time` is nonzero and older than
    /// `stale_before_millis`. Resets each returned entry's timestamp to the
    /// current scan time so a single stall only fires a reconnect once.
    pub fn stalled_sessions(&self, stale_before_millis: i64, now_millis: i64) -> Vec<SessionKey> {
        let mut stalled = Vec::new();
        for item in self.entries.iter() {
            let last = item.value().last_message_time.load(Ordering::SeqCst);
            if last != 0 && last < stale_before_millis {
                item.value().last_message_time.store(now_millis, Ordering::SeqCst);
                stalled.push(*item.key());
            }
        }
        stalled
    }
}

impl Default for RetryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_protocol::Venue;

    fn key(i: usize) -> SessionKey {
        SessionKey { venue: Venue::Huobi, chunk_index: i }
    }

    #[test]
    fn backoff_is_linear_and_capped() {
        let ledger = RetryLedger::new();
        let k = key(0);
        for expected in 1..=15u64 {
            let backoff = ledger.record_failure(k, 10);
            assert_eq!(backoff, expected.min(10));
        }
    }

    #[test]
    fn success_resets_retry_count() {
        let ledger = RetryLedger::new();
        let k = key(0);
        ledger.record_failure(k, 10);
        ledger.record_failure(k, 10);
        ledger.record_success(k);
        assert_eq!(ledger.record_failure(k, 10), 1);
    }

    #[test]
    fn sessions_never_touched_are_not_stalled() {
        let ledger = RetryLedger::new();
        ledger.entry(key(0));
        assert!(ledger.stalled_sessions(i64::MAX, 0).is_empty());
    }

    #[test]
    fn stalled_sessions_are_reported_once_per_scan() {
        let ledger = RetryLedger::new();
        let k = key(0);
        ledger.touch(k, 1000);
        let first = ledger.stalled_sessions(2000, 5000);
        assert_eq!(first, vec![k]);
        let second = ledger.stalled_sessions(2000, 6000);
        assert!(second.is_empty(), "resetting last_message_time should suppress repeat firing");
    }
}
