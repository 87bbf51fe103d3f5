//! Bounded, insertion-ordered duplicate filter plus companion message store.
//! Both live in one map so eviction is always in lockstep; entries are
//! never promoted on lookup, only on first insertion, so iteration order
//! stays strict insertion order as `recent(k)` requires.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::protocol::Envelope;

pub const CAPACITY: usize = 10_000;

pub struct SeenStore {
    entries: LruCache<String, Option<Envelope>>,
}

impl SeenStore {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(CAPACITY).unwrap());
        Self {
            entries: LruCache::new(cap),
        }
    }

    pub fn contains(&self, msg_id: &str) -> bool {
        self.entries.contains(msg_id)
    }

    /// Idempotent: re-marking an id already present is a no-op, so
    /// insertion order (and hence eviction order) never shifts on replay.
    pub fn mark(&mut self, msg_id: &str, envelope: Option<Envelope>) {
        if self.entries.contains(msg_id) {
            return;
        }
        self.entries.push(msg_id.to_string(), envelope);
    }

    pub fn get(&self, msg_id: &str) -> Option<&Envelope> {
        self.entries.peek(msg_id).and_then(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently inserted `k` message ids, front (newest) first.
    pub fn recent(&self, k: usize) -> Vec<String> {
        self.entries.iter().take(k).map(|(id, _)| id.clone()).collect()
    }
}
