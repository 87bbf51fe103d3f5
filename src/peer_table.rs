//! Bounded peer table keyed by "host:port", evicting the least-recently-seen
//! entry at capacity with a deterministic lex-order tie-break.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub struct Peer {
    pub node_id: String,
    pub last_seen_ms: u64,
}

pub struct PeerTable {
    self_addr: String,
    limit: usize,
    peers: HashMap<String, Peer>,
}

impl PeerTable {
    pub fn new(self_addr: impl Into<String>, limit: usize) -> Self {
        Self {
            self_addr: self_addr.into(),
            limit,
            peers: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.peers.contains_key(addr)
    }

    /// Returns `Some(evicted_addr)` if capacity eviction happened, `None`
    /// otherwise (no-op on self-address, or a touch of an existing entry).
    pub fn touch(&mut self, addr: &str, node_id: &str, now_ms: u64) -> Option<String> {
        if addr == self.self_addr {
            return None;
        }
        if let Some(existing) = self.peers.get_mut(addr) {
            existing.last_seen_ms = existing.last_seen_ms.max(now_ms);
            if !node_id.is_empty() {
                existing.node_id = node_id.to_string();
            }
            return None;
        }

        let evicted = if self.peers.len() >= self.limit {
            Some(self.evict_oldest())
        } else {
            None
        };

        self.peers.insert(
            addr.to_string(),
            Peer {
                node_id: node_id.to_string(),
                last_seen_ms: now_ms,
            },
        );
        evicted
    }

    fn evict_oldest(&mut self) -> String {
        let victim = self
            .peers
            .iter()
            .min_by(|a, b| {
                a.1.last_seen_ms
                    .cmp(&b.1.last_seen_ms)
                    .then_with(|| a.0.cmp(b.0))
            })
            .map(|(addr, _)| addr.clone())
            .expect("evict_oldest called on non-empty table");
        self.peers.remove(&victim);
        victim
    }

    pub fn remove(&mut self, addr: &str) -> bool {
        self.peers.remove(addr).is_some()
    }

    /// Remove every entry whose last-seen is older than `now_ms - timeout_ms`.
    pub fn sweep(&mut self, now_ms: u64, timeout_ms: u64) -> Vec<String> {
        let cutoff = now_ms.saturating_sub(timeout_ms);
        let stale: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, p)| p.last_seen_ms < cutoff)
            .map(|(addr, _)| addr.clone())
            .collect();
        for addr in &stale {
            self.peers.remove(addr);
        }
        stale
    }

    /// `k` distinct addresses drawn uniformly without replacement, using the
    /// node's seeded PRNG stream. Returns every remaining address if fewer
    /// than `k` qualify.
    pub fn sample(&self, rng: &mut StdRng, k: usize, exclude: Option<&str>) -> Vec<String> {
        let mut candidates: Vec<&String> = self
            .peers
            .keys()
            .filter(|addr| Some(addr.as_str()) != exclude)
            .collect();
        candidates.sort();
        let chosen: Vec<String> = candidates
            .choose_multiple(rng, k.min(candidates.len()))
            .map(|s| (*s).clone())
            .collect();
        chosen
    }

    /// Up to `limit` entries, in (sorted) iteration order, for a PEERS_LIST.
    pub fn snapshot(&self, limit: usize) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .peers
            .iter()
            .map(|(addr, p)| (addr.clone(), p.node_id.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.truncate(limit);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn self_address_never_added() {
        let mut table = PeerTable::new("127.0.0.1:9000", 2);
        assert_eq!(table.touch("127.0.0.1:9000", "self", 0), None);
        assert!(!table.contains("127.0.0.1:9000"));
    }

    #[test]
    fn capacity_evicts_oldest_with_lex_tiebreak() {
        let mut table = PeerTable::new("127.0.0.1:9000", 2);
        table.touch("127.0.0.1:9002", "b", 100);
        table.touch("127.0.0.1:9001", "a", 100);
        let evicted = table.touch("127.0.0.1:9003", "c", 200);
        // both 9001 and 9002 tied at ts=100; lex-smallest address wins the tie-break
        assert_eq!(evicted, Some("127.0.0.1:9001".to_string()));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn touch_refreshes_existing_entry() {
        let mut table = PeerTable::new("127.0.0.1:9000", 5);
        table.touch("127.0.0.1:9001", "", 10);
        table.touch("127.0.0.1:9001", "node-a", 20);
        let snap = table.snapshot(10);
        assert_eq!(snap, vec![("127.0.0.1:9001".to_string(), "node-a".to_string())]);
    }

    #[test]
    fn sweep_removes_stale_entries() {
        let mut table = PeerTable::new("127.0.0.1:9000", 5);
        table.touch("127.0.0.1:9001", "a", 0);
        table.touch("127.0.0.1:9002", "b", 1000);
        let removed = table.sweep(1000, 500);
        assert_eq!(removed, vec!["127.0.0.1:9001".to_string()]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn sample_never_exceeds_table_size() {
        let mut table = PeerTable::new("127.0.0.1:9000", 5);
        table.touch("127.0.0.1:9001", "a", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let sampled = table.sample(&mut rng, 5, None);
        assert_eq!(sampled.len(), 1);
    }

    #[test]
    fn sample_excludes_requested_address() {
        let mut table = PeerTable::new("127.0.0.1:9000", 5);
        table.touch("127.0.0.1:9001", "a", 0);
        table.touch("127.0.0.1:9002", "b", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let sampled = table.sample(&mut rng, 5, Some("127.0.0.1:9001"));
        assert_eq!(sampled, vec!["127.0.0.1:9002".to_string()]);
    }
}
