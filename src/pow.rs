//! Brute-force admission proof-of-work: binds a costly-to-produce,
//! cheap-to-verify hash puzzle to a claimed node identity.

use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::protocol::PowToken;

fn digest_hex(identity: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn has_leading_zeros(hex_digest: &str, k: u32) -> bool {
    hex_digest.as_bytes().iter().take(k as usize).all(|&b| b == b'0')
}

/// Search `nonce = 0, 1, 2, ...` for the first value whose digest begins
/// with `k` hex zeros. CPU-bound; runs once at node start.
pub fn compute(identity: &str, k: u32) -> PowToken {
    let start = Instant::now();
    let mut nonce: u64 = 0;
    let digest = loop {
        let digest = digest_hex(identity, nonce);
        if has_leading_zeros(&digest, k) {
            break digest;
        }
        nonce += 1;
    };
    PowToken {
        algorithm: "sha256".to_string(),
        k,
        nonce,
        digest_hex: digest,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// A verified token binds admission to `claimed_identity`: replaying a
/// token computed for a different identity must fail.
pub fn verify(claimed_identity: &str, token: Option<&PowToken>, required_k: u32) -> bool {
    let Some(token) = token else { return false };
    if token.k < required_k {
        return false;
    }
    let recomputed = digest_hex(claimed_identity, token.nonce);
    recomputed == token.digest_hex && has_leading_zeros(&recomputed, required_k)
}
