use crate::determinism::json_canonical;
use crate::error::{CoreError, CoreResult};
use crate::model::DetectorOutput;
use sha2::{Digest, Sha256};

pub fn run_id_from_fingerprint_hex32(fingerprint_hex: &str) -> CoreResult<String> {
    let hex = fingerprint_hex.trim();
    if hex.len() < 32 || !hex.chars().take(32).all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidInput(
            "fingerprint must be hex with length >= 32".to_string(),
        ));
    }
    Ok(format!("r_{}", hex[..32].to_ascii_lowercase()))
}

/// Run id over a set of detector outputs. Each output is hashed on its own
/// canonical JSON and the digests are sorted, so arrival order does not matter.
pub fn run_id_for_detections(outputs: &[DetectorOutput]) -> CoreResult<String> {
    let mut digests = Vec::with_capacity(outputs.len());
    for o in outputs {
        digests.push(sha256_hex(&json_canonical::to_canonical_bytes(o)?));
    }
    digests.sort();
    let fingerprint = sha256_hex(digests.join("\n").as_bytes());
    run_id_from_fingerprint_hex32(&fingerprint)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// First `len` hex characters of the SHA-256 of `bytes`.
pub fn short_hash(bytes: &[u8], len: usize) -> String {
    let full = sha256_hex(bytes);
    full[..len.min(full.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_requires_hex() {
        assert!(run_id_from_fingerprint_hex32("xyz").is_err());
        let id = run_id_from_fingerprint_hex32(&sha256_hex(b"abc")).unwrap();
        assert!(id.starts_with("r_"));
        assert_eq!(id.len(), 34);
    }

    #[test]
    fn short_hash_is_prefix() {
        assert_eq!(short_hash(b"abc", 8), sha256_hex(b"abc")[..8]);
    }
}
