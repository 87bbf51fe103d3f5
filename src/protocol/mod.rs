pub mod codec;
pub mod types;

pub use types::{
    Envelope, EnvelopeBuilder, GetPeersPayload, GossipPayload, HelloPayload, IHavePayload,
    IWantPayload, Kind, Payload, PeerEntryWire, PeersListPayload, PingPayload, PongPayload,
    PowToken,
};
