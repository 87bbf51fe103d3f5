//! Per-kind dispatch. Every handler starts by touching the sender in the
//! peer table unless noted; every failure is logged and swallowed here,
//! never propagated to the event loop.

use tracing::info;

use crate::node::{GossipNode, NodeEvent};
use crate::pow;
use crate::protocol::{Envelope, Kind, PeerEntryWire};

impl GossipNode {
    pub(crate) async fn dispatch(&mut self, envelope: Envelope, from: String) {
        match envelope.kind() {
            Kind::Hello => self.handle_hello(envelope, from).await,
            Kind::GetPeers => self.handle_get_peers(envelope, from).await,
            Kind::PeersList => self.handle_peers_list(envelope, from).await,
            Kind::Gossip => self.handle_gossip(envelope, from).await,
            Kind::Ping => self.handle_ping(envelope, from).await,
            Kind::Pong => self.handle_pong(envelope, from).await,
            Kind::IHave => self.handle_ihave(envelope, from).await,
            Kind::IWant => self.handle_iwant(envelope, from).await,
        }
    }

    async fn handle_hello(&mut self, envelope: Envelope, from: String) {
        let required_k = self.state.config.pow_k;
        if required_k > 0 {
            let token = envelope.payload.as_hello().and_then(|h| h.pow.as_ref());
            if !pow::verify(&envelope.sender_id, token, required_k) {
                info!("HELLO from {from} rejected (invalid PoW)");
                self.state.emit(NodeEvent::HelloRejected { addr: from });
                return;
            }
        }

        self.state.touch_peer(&from, &envelope.sender_id);
        info!("HELLO from {from}");
        self.state.emit(NodeEvent::HelloFrom { addr: from.clone() });

        let peers = self
            .state
            .peers
            .snapshot(self.state.config.peer_limit)
            .into_iter()
            .map(|(addr, node_id)| PeerEntryWire { node_id, addr })
            .collect();
        let reply = self.state.builder().peers_list(peers);
        self.state.send_to(&from, &reply).await;
    }

    async fn handle_get_peers(&mut self, envelope: Envelope, from: String) {
        let required_k = self.state.config.pow_k;
        if required_k > 0 && !self.state.peers.contains(&from) {
            return;
        }

        self.state.touch_peer(&from, &envelope.sender_id);
        let max_peers = envelope
            .payload
            .as_get_peers()
            .map(|p| p.max_peers as usize)
            .unwrap_or(self.state.config.peer_limit);

        let peers = self
            .state
            .peers
            .snapshot(max_peers)
            .into_iter()
            .map(|(addr, node_id)| PeerEntryWire { node_id, addr })
            .collect();
        let reply = self.state.builder().peers_list(peers);
        self.state.send_to(&from, &reply).await;
    }

    async fn handle_peers_list(&mut self, envelope: Envelope, from: String) {
        self.state.touch_peer(&from, &envelope.sender_id);
        if let Some(list) = envelope.payload.as_peers_list() {
            for entry in &list.peers {
                self.state.touch_peer(&entry.addr, &entry.node_id);
            }
        }
    }

    async fn handle_gossip(&mut self, envelope: Envelope, from: String) {
        if self.state.seen.contains(&envelope.msg_id) {
            return;
        }

        let short_id = envelope.short_id().to_string();
        self.state.seen.mark(&envelope.msg_id, Some(envelope.clone()));
        self.state.touch_peer(&from, &envelope.sender_id);
        info!("GOSSIP recv  msg_id={short_id}");
        self.state.emit(NodeEvent::GossipRecv { msg_id: short_id.clone() });

        if envelope.ttl.saturating_sub(1) == 0 {
            return;
        }
        let Some(payload) = envelope.payload.as_gossip().cloned() else {
            return;
        };

        let targets = self
            .state
            .peers
            .sample(&mut self.state.rng, self.state.config.fanout, Some(&from));
        let new_ttl = envelope.ttl - 1;
        for target in targets {
            let fwd = self
                .state
                .builder()
                .forwarded_gossip(envelope.msg_id.clone(), payload.clone(), new_ttl);
            info!("GOSSIP fwd   msg_id={short_id} -> {target}  ttl={new_ttl}");
            self.state.emit(NodeEvent::GossipForward { msg_id: short_id.clone(), target: target.clone() });
            self.state.send_to(&target, &fwd).await;
        }
    }

    async fn handle_ping(&mut self, envelope: Envelope, from: String) {
        self.state.touch_peer(&from, &envelope.sender_id);
        let Some(ping) = envelope.payload.as_ping() else { return };
        let reply = self.state.builder().pong(ping.ping_id.clone(), ping.seq);
        self.state.send_to(&from, &reply).await;
    }

    async fn handle_pong(&mut self, envelope: Envelope, from: String) {
        if let Some(pong) = envelope.payload.as_pong() {
            self.state.pending_pings.remove(&pong.ping_id);
        }
        self.state.touch_peer(&from, &envelope.sender_id);
    }

    async fn handle_ihave(&mut self, envelope: Envelope, from: String) {
        self.state.touch_peer(&from, &envelope.sender_id);
        let Some(ihave) = envelope.payload.as_ihave() else { return };
        let missing: Vec<String> = ihave
            .ids
            .iter()
            .filter(|id| !self.state.seen.contains(id))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }
        let reply = self.state.builder().iwant(missing);
        self.state.send_to(&from, &reply).await;
    }

    async fn handle_iwant(&mut self, envelope: Envelope, from: String) {
        self.state.touch_peer(&from, &envelope.sender_id);
        let Some(iwant) = envelope.payload.as_iwant() else { return };
        for id in &iwant.ids {
            let Some(stored) = self.state.seen.get(id) else { continue };
            let Some(payload) = stored.payload.as_gossip().cloned() else { continue };
            let msg_id = stored.msg_id.clone();
            let reply = self.state.builder().forwarded_gossip(msg_id, payload, 1);
            self.state.send_to(&from, &reply).await;
        }
    }

    /// Application-input → fresh GOSSIP broadcast to `fanout` peers drawn
    /// from the whole table (no exclusion, unlike forwarding).
    pub(crate) async fn broadcast_gossip(&mut self, data: String) {
        if self.state.peers.is_empty() {
            info!("no peers to broadcast to, dropping injected message");
            return;
        }

        let envelope = self.state.builder().gossip("news", data.clone());
        let short_id = envelope.short_id().to_string();
        self.state.seen.mark(&envelope.msg_id, Some(envelope.clone()));
        info!("GOSSIP new   msg_id={short_id}  data={data}");
        self.state.emit(NodeEvent::GossipNew { msg_id: short_id.clone() });

        let payload = envelope.payload.as_gossip().cloned().expect("just built as gossip");
        let targets = self
            .state
            .peers
            .sample(&mut self.state.rng, self.state.config.fanout, None);
        for target in targets {
            let fwd = self
                .state
                .builder()
                .forwarded_gossip(envelope.msg_id.clone(), payload.clone(), self.state.config.ttl);
            self.state.send_to(&target, &fwd).await;
        }
    }
}
