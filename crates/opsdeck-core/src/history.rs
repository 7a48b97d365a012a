//! Bounded, newest-first operation history.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

// ── HistoryEntry<T> ──────────────────────────────────────────────────────────

/// One completed operation result and when it arrived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry<T> {
    pub result: T,
    pub received_at: DateTime<Local>,
}

impl<T> HistoryEntry<T> {
    pub fn new(result: T) -> Self {
        Self {
            result,
            received_at: Local::now(),
        }
    }

    pub fn at(result: T, received_at: DateTime<Local>) -> Self {
        Self {
            result,
            received_at,
        }
    }
}

// ── HistoryLog<T> ────────────────────────────────────────────────────────────

/// A fixed-capacity log that keeps the newest entry at index 0 and drops the
/// oldest once full.
#[derive(Debug, Clone)]
pub struct HistoryLog<T> {
    buf: VecDeque<HistoryEntry<T>>,
    capacity: usize,
}

impl<T> HistoryLog<T> {
    /// Create an empty log holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at position 0, evicting the oldest entry if over capacity.
    pub fn push(&mut self, entry: HistoryEntry<T>) {
        if self.capacity == 0 {
            return;
        }
        self.buf.push_front(entry);
        while self.buf.len() > self.capacity {
            self.buf.pop_back();
        }
    }

    /// Iterate newest first. Never mutates; restartable.
    pub fn list(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.buf.iter()
    }

    /// Entry at `index` counting from the newest (0).
    pub fn get(&self, index: usize) -> Option<&HistoryEntry<T>> {
        self.buf.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryEntry<T>> {
        self.buf.front()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
