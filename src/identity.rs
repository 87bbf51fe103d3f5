use rand::RngCore;

/// Per-process identity: a random 128-bit value rendered as lowercase hex,
/// plus the "host:port" this process listens on. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub id: String,
    pub addr: String,
}

impl NodeIdentity {
    pub fn generate(addr: impl Into<String>) -> Self {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            id: hex::encode(bytes),
            addr: addr.into(),
        }
    }
}

/// Fresh 128-bit id rendered as 32 lowercase hex characters, used for
/// msg_id, ping_id and the like. Not tied to any particular identity.
pub fn random_hex128() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}
