//! Self-describing textual (JSON) envelope framing: one record per
//! datagram, no length prefix. The rest of the crate only ever sees
//! [`Envelope`]/[`Payload`]/[`Kind`]; the JSON shape is owned here.

use serde_json::{json, Value};

use crate::error::CodecError;
use crate::protocol::types::{
    Envelope, GetPeersPayload, GossipPayload, HelloPayload, IHavePayload, IWantPayload, Kind,
    Payload, PeersListPayload, PingPayload, PongPayload,
};

pub fn encode(envelope: &Envelope) -> Vec<u8> {
    let payload = encode_payload(&envelope.payload);
    let record = json!({
        "version": envelope.version,
        "msg_id": envelope.msg_id,
        "msg_type": envelope.kind().as_wire(),
        "sender_id": envelope.sender_id,
        "sender_addr": envelope.sender_addr,
        "timestamp_ms": envelope.timestamp_ms,
        "ttl": envelope.ttl,
        "payload": payload,
    });
    record.to_string().into_bytes()
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::NotTextual)?;
    let value: Value = serde_json::from_str(text).map_err(|_| CodecError::NotTextual)?;
    let record = value.as_object().ok_or(CodecError::NotARecord)?;

    let msg_type = record
        .get("msg_type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("msg_type"))?;
    let kind = Kind::from_wire(msg_type).ok_or_else(|| CodecError::UnknownKind(msg_type.into()))?;

    let msg_id = record
        .get("msg_id")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("msg_id"))?
        .to_string();
    let sender_id = record
        .get("sender_id")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("sender_id"))?
        .to_string();
    let sender_addr = record
        .get("sender_addr")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("sender_addr"))?
        .to_string();

    let version = record.get("version").and_then(Value::as_u64).unwrap_or(1) as u32;
    let timestamp_ms = record.get("timestamp_ms").and_then(Value::as_u64).unwrap_or(0);
    let ttl = record.get("ttl").and_then(Value::as_u64).unwrap_or(0) as u32;

    let payload_value = record.get("payload").cloned().unwrap_or(Value::Object(Default::default()));
    let payload = decode_payload(kind, payload_value)?;

    Ok(Envelope {
        version,
        msg_id,
        sender_id,
        sender_addr,
        timestamp_ms,
        ttl,
        payload,
    })
}

fn encode_payload(payload: &Payload) -> Value {
    match payload {
        Payload::Hello(p) => serde_json::to_value(p),
        Payload::GetPeers(p) => serde_json::to_value(p),
        Payload::PeersList(p) => serde_json::to_value(p),
        Payload::Gossip(p) => serde_json::to_value(p),
        Payload::Ping(p) => serde_json::to_value(p),
        Payload::Pong(p) => serde_json::to_value(p),
        Payload::IHave(p) => serde_json::to_value(p),
        Payload::IWant(p) => serde_json::to_value(p),
    }
    .unwrap_or(Value::Null)
}

fn decode_payload(kind: Kind, value: Value) -> Result<Payload, CodecError> {
    let bad = |e: serde_json::Error| CodecError::BadPayload(kind.as_wire(), e.to_string());
    Ok(match kind {
        Kind::Hello => Payload::Hello(serde_json::from_value::<HelloPayload>(value).map_err(bad)?),
        Kind::GetPeers => {
            Payload::GetPeers(serde_json::from_value::<GetPeersPayload>(value).map_err(bad)?)
        }
        Kind::PeersList => {
            Payload::PeersList(serde_json::from_value::<PeersListPayload>(value).map_err(bad)?)
        }
        Kind::Gossip => Payload::Gossip(serde_json::from_value::<GossipPayload>(value).map_err(bad)?),
        Kind::Ping => Payload::Ping(serde_json::from_value::<PingPayload>(value).map_err(bad)?),
        Kind::Pong => Payload::Pong(serde_json::from_value::<PongPayload>(value).map_err(bad)?),
        Kind::IHave => Payload::IHave(serde_json::from_value::<IHavePayload>(value).map_err(bad)?),
        Kind::IWant => Payload::IWant(serde_json::from_value::<IWantPayload>(value).map_err(bad)?),
    })
}
