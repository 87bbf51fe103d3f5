//! Wire round-trip coverage for every envelope kind, plus the literal
//! bad-frame rejection cases.

use gossipd::protocol::{codec, EnvelopeBuilder, Kind, PeerEntryWire, PowToken};

fn builder() -> EnvelopeBuilder {
    EnvelopeBuilder::new("sender-id", "127.0.0.1:9000", 8)
}

#[test]
fn ping_roundtrip_matches_literal_scenario() {
    let builder = EnvelopeBuilder::new("abc", "127.0.0.1:8000", 0);
    let env = builder.ping(17);
    let decoded = codec::decode(&codec::encode(&env)).unwrap();
    assert_eq!(decoded.kind(), Kind::Ping);
    assert_eq!(decoded.payload.as_ping().unwrap().seq, 17);
    assert_eq!(
        decoded.payload.as_ping().unwrap().ping_id,
        env.payload.as_ping().unwrap().ping_id
    );
}

#[test]
fn hello_with_pow_roundtrips() {
    let token = PowToken {
        algorithm: "sha256".into(),
        k: 3,
        nonce: 12345,
        digest_hex: "000abc".into(),
        elapsed_ms: 4.2,
    };
    let env = builder().hello(vec!["udp".into(), "json".into()], Some(token.clone()));
    let decoded = codec::decode(&codec::encode(&env)).unwrap();
    assert_eq!(decoded.payload.as_hello().unwrap().pow.as_ref().unwrap(), &token);
}

#[test]
fn hello_without_pow_omits_field() {
    let env = builder().hello(vec!["udp".into()], None);
    let bytes = codec::encode(&env);
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(!text.contains("\"pow\""));
}

#[test]
fn get_peers_roundtrips() {
    let env = builder().get_peers(10);
    let decoded = codec::decode(&codec::encode(&env)).unwrap();
    assert_eq!(decoded.payload.as_get_peers().unwrap().max_peers, 10);
}

#[test]
fn peers_list_roundtrips() {
    let env = builder().peers_list(vec![
        PeerEntryWire { node_id: "n1".into(), addr: "127.0.0.1:9001".into() },
        PeerEntryWire { node_id: "n2".into(), addr: "127.0.0.1:9002".into() },
    ]);
    let decoded = codec::decode(&codec::encode(&env)).unwrap();
    assert_eq!(decoded.payload.as_peers_list().unwrap().peers.len(), 2);
}

#[test]
fn gossip_roundtrips_with_origin_fields() {
    let env = builder().gossip("news", "hello world");
    let decoded = codec::decode(&codec::encode(&env)).unwrap();
    let gossip = decoded.payload.as_gossip().unwrap();
    assert_eq!(gossip.topic, "news");
    assert_eq!(gossip.data, "hello world");
    assert_eq!(gossip.origin_id, "sender-id");
}

#[test]
fn ihave_and_iwant_roundtrip() {
    let ihave = builder().ihave(vec!["a".into(), "b".into()], 32);
    let decoded = codec::decode(&codec::encode(&ihave)).unwrap();
    assert_eq!(decoded.payload.as_ihave().unwrap().ids, vec!["a", "b"]);

    let iwant = builder().iwant(vec!["a".into()]);
    let decoded = codec::decode(&codec::encode(&iwant)).unwrap();
    assert_eq!(decoded.payload.as_iwant().unwrap().ids, vec!["a"]);
}

#[test]
fn bad_frames_return_the_failure_indicator() {
    assert!(codec::decode(b"not json at all").is_err());
    assert!(codec::decode(b"").is_err());
    assert!(codec::decode(b"[1,2,3]").is_err());
    assert!(codec::decode(br#"{"msg_type":"UNKNOWN"}"#).is_err());
}

#[test]
fn same_envelope_encodes_identically() {
    let env = builder().ping(1);
    assert_eq!(codec::encode(&env), codec::encode(&env));
}
