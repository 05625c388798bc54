use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

use tokio::time::Instant;

/// Process-wide counters, written by the poller and the deletion tasks and read
/// by the status server.
#[derive(Debug)]
pub struct RuntimeStats {
    started_at: Instant,
    in_flight: AtomicUsize,
    deleted: AtomicU64,
    already_gone: AtomicU64,
    not_deletable: AtomicU64,
    abandoned: AtomicU64,
    polls_ok: AtomicU64,
    polls_failed: AtomicU64,
    cursor: AtomicI64,
}

/// Point-in-time copy of [`RuntimeStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub in_flight_deletions: usize,
    pub deleted: u64,
    pub already_gone: u64,
    pub not_deletable: u64,
    pub abandoned: u64,
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub cursor: i64,
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            in_flight: AtomicUsize::new(0),
            deleted: AtomicU64::new(0),
            already_gone: AtomicU64::new(0),
            not_deletable: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            polls_ok: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
            cursor: AtomicI64::new(0),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn task_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_already_gone(&self) {
        self.already_gone.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_deletable(&self) {
        self.not_deletable.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_poll(&self, ok: bool) {
        if ok {
            self.polls_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.polls_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn set_cursor(&self, cursor: i64) {
        self.cursor.store(cursor, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            in_flight_deletions: self.in_flight(),
            deleted: self.deleted.load(Ordering::Relaxed),
            already_gone: self.already_gone.load(Ordering::Relaxed),
            not_deletable: self.not_deletable.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            polls_ok: self.polls_ok.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            cursor: self.cursor.load(Ordering::Relaxed),
        }
    }
}
