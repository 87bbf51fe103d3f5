use serde::{Deserialize, Serialize};

/// One of the eight recognized envelope kinds. The wire label is the
/// upper-snake-case string used in `msg_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Hello,
    GetPeers,
    PeersList,
    Gossip,
    Ping,
    Pong,
    IHave,
    IWant,
}

impl Kind {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Kind::Hello => "HELLO",
            Kind::GetPeers => "GET_PEERS",
            Kind::PeersList => "PEERS_LIST",
            Kind::Gossip => "GOSSIP",
            Kind::Ping => "PING",
            Kind::Pong => "PONG",
            Kind::IHave => "IHAVE",
            Kind::IWant => "IWANT",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "HELLO" => Kind::Hello,
            "GET_PEERS" => Kind::GetPeers,
            "PEERS_LIST" => Kind::PeersList,
            "GOSSIP" => Kind::Gossip,
            "PING" => Kind::Ping,
            "PONG" => Kind::Pong,
            "IHAVE" => Kind::IHave,
            "IWANT" => Kind::IWant,
            _ => return None,
        })
    }
}

/// Admission token presented inside a HELLO payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowToken {
    pub algorithm: String,
    pub k: u32,
    pub nonce: u64,
    pub digest_hex: String,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloPayload {
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow: Option<PowToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPeersPayload {
    pub max_peers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerEntryWire {
    pub node_id: String,
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeersListPayload {
    pub peers: Vec<PeerEntryWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipPayload {
    pub topic: String,
    pub data: String,
    pub origin_id: String,
    pub origin_timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingPayload {
    pub ping_id: String,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongPayload {
    pub ping_id: String,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IHavePayload {
    pub ids: Vec<String>,
    pub max_ids: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IWantPayload {
    pub ids: Vec<String>,
}

/// Kind-specific payload shape. Never exposed as a raw JSON value outside
/// the codec module.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Hello(HelloPayload),
    GetPeers(GetPeersPayload),
    PeersList(PeersListPayload),
    Gossip(GossipPayload),
    Ping(PingPayload),
    Pong(PongPayload),
    IHave(IHavePayload),
    IWant(IWantPayload),
}

impl Payload {
    pub fn kind(&self) -> Kind {
        match self {
            Payload::Hello(_) => Kind::Hello,
            Payload::GetPeers(_) => Kind::GetPeers,
            Payload::PeersList(_) => Kind::PeersList,
            Payload::Gossip(_) => Kind::Gossip,
            Payload::Ping(_) => Kind::Ping,
            Payload::Pong(_) => Kind::Pong,
            Payload::IHave(_) => Kind::IHave,
            Payload::IWant(_) => Kind::IWant,
        }
    }

    pub fn as_gossip(&self) -> Option<&GossipPayload> {
        match self {
            Payload::Gossip(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_ping(&self) -> Option<&PingPayload> {
        match self {
            Payload::Ping(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pong(&self) -> Option<&PongPayload> {
        match self {
            Payload::Pong(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_hello(&self) -> Option<&HelloPayload> {
        match self {
            Payload::Hello(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_get_peers(&self) -> Option<&GetPeersPayload> {
        match self {
            Payload::GetPeers(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_peers_list(&self) -> Option<&PeersListPayload> {
        match self {
            Payload::PeersList(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_ihave(&self) -> Option<&IHavePayload> {
        match self {
            Payload::IHave(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_iwant(&self) -> Option<&IWantPayload> {
        match self {
            Payload::IWant(p) => Some(p),
            _ => None,
        }
    }
}

/// A wire message: immutable once built, created only through the `new_*`
/// factories below or by the codec on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub version: u32,
    pub msg_id: String,
    pub sender_id: String,
    pub sender_addr: String,
    pub timestamp_ms: u64,
    pub ttl: u32,
    pub payload: Payload,
}

impl Envelope {
    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    /// First 8 hex characters of the message id, the stable prefix analysis
    /// tooling correlates events by.
    pub fn short_id(&self) -> &str {
        &self.msg_id[..8.min(self.msg_id.len())]
    }
}

pub struct EnvelopeBuilder {
    sender_id: String,
    sender_addr: String,
    ttl: u32,
}

impl EnvelopeBuilder {
    pub fn new(sender_id: impl Into<String>, sender_addr: impl Into<String>, ttl: u32) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_addr: sender_addr.into(),
            ttl,
        }
    }

    fn base(&self, payload: Payload) -> Envelope {
        Envelope {
            version: 1,
            msg_id: crate::identity::random_hex128(),
            sender_id: self.sender_id.clone(),
            sender_addr: self.sender_addr.clone(),
            timestamp_ms: crate::identity::now_ms(),
            ttl: self.ttl,
            payload,
        }
    }

    pub fn hello(&self, capabilities: Vec<String>, pow: Option<PowToken>) -> Envelope {
        self.base(Payload::Hello(HelloPayload { capabilities, pow }))
    }

    pub fn get_peers(&self, max_peers: u32) -> Envelope {
        self.base(Payload::GetPeers(GetPeersPayload { max_peers }))
    }

    pub fn peers_list(&self, peers: Vec<PeerEntryWire>) -> Envelope {
        self.base(Payload::PeersList(PeersListPayload { peers }))
    }

    pub fn gossip(&self, topic: impl Into<String>, data: impl Into<String>) -> Envelope {
        self.base(Payload::Gossip(GossipPayload {
            topic: topic.into(),
            data: data.into(),
            origin_id: self.sender_id.clone(),
            origin_timestamp_ms: crate::identity::now_ms(),
        }))
    }

    pub fn ping(&self, seq: u64) -> Envelope {
        self.base(Payload::Ping(PingPayload {
            ping_id: crate::identity::random_hex128(),
            seq,
        }))
    }

    pub fn pong(&self, ping_id: impl Into<String>, seq: u64) -> Envelope {
        self.base(Payload::Pong(PongPayload {
            ping_id: ping_id.into(),
            seq,
        }))
    }

    pub fn ihave(&self, ids: Vec<String>, max_ids: u32) -> Envelope {
        self.base(Payload::IHave(IHavePayload { ids, max_ids }))
    }

    pub fn iwant(&self, ids: Vec<String>) -> Envelope {
        self.base(Payload::IWant(IWantPayload { ids }))
    }

    /// Rebuilds a GOSSIP envelope around an existing `msg_id` and payload,
    /// for forwarding and IWANT replay, where the origin fields inside the
    /// payload must survive untouched even though sender and ttl change.
    pub fn forwarded_gossip(&self, msg_id: impl Into<String>, payload: GossipPayload, ttl: u32) -> Envelope {
        Envelope {
            version: 1,
            msg_id: msg_id.into(),
            sender_id: self.sender_id.clone(),
            sender_addr: self.sender_addr.clone(),
            timestamp_ms: crate::identity::now_ms(),
            ttl,
            payload: Payload::Gossip(payload),
        }
    }
}
