//! The three cooperative periodic loops: ping/timeout, optional pull
//! anti-entropy advertisement, and (driven from `node.rs`'s event loop)
//! application input.

use tracing::info;

use crate::identity::now_ms;
use crate::node::{GossipNode, NodeEvent};

impl GossipNode {
    pub(crate) async fn on_ping_tick(&mut self) {
        let now = now_ms();
        let timeout_ms = (self.state.config.peer_timeout * 1000.0) as u64;

        let evicted = self.state.peers.sweep(now, timeout_ms);
        for addr in evicted {
            info!("peer removed {addr}");
            self.state.emit(NodeEvent::PeerRemoved { addr });
        }

        self.state
            .pending_pings
            .retain(|_, &mut sent_ms| sent_ms >= now.saturating_sub(timeout_ms));

        if self.state.peers.is_empty() {
            return;
        }

        let targets = self
            .state
            .peers
            .sample(&mut self.state.rng, self.state.config.fanout, None);
        for target in targets {
            self.state.ping_seq += 1;
            let seq = self.state.ping_seq;
            let ping = self.state.builder().ping(seq);
            let ping_id = ping.payload.as_ping().expect("just built as ping").ping_id.clone();
            self.state.pending_pings.insert(ping_id, now);
            self.state.send_to(&target, &ping).await;
        }
    }

    pub(crate) async fn on_pull_tick(&mut self) {
        if self.state.peers.is_empty() || self.state.seen.is_empty() {
            return;
        }

        let ids = self.state.seen.recent(self.state.config.ihave_max_ids);
        let targets = self
            .state
            .peers
            .sample(&mut self.state.rng, self.state.config.fanout, None);
        let max_ids = self.state.config.ihave_max_ids as u32;
        let ihave = self.state.builder().ihave(ids, max_ids);
        for target in targets {
            self.state.send_to(&target, &ihave).await;
        }
    }
}
