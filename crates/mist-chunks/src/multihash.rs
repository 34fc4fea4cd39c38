//! sha2-256 multihash content addressing
//!
//! An address is `0x12 (sha2-256) || 0x20 (32-byte digest) || sha256(block)`,
//! which is exactly the multihash inside an IPFS CIDv0. Its base58 text
//! therefore starts with `Qm`.

use sha2::{Digest, Sha256};

use mist_core::{Address, ADDRESS_SIZE};

const SHA2_256_CODE: u8 = 0x12;
const SHA2_256_LEN: u8 = 0x20;

/// Address of `data` as a content-addressed store would assign it.
pub fn address_of(data: &[u8]) -> Address {
    let digest = Sha256::digest(data);
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes[0] = SHA2_256_CODE;
    bytes[1] = SHA2_256_LEN;
    bytes[2..].copy_from_slice(&digest);
    Address::from_bytes(bytes)
}

/// True when `data` hashes to `address`.
pub fn verify(address: &Address, data: &[u8]) -> bool {
    address_of(data) == *address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_matches_ipfs() {
        // sha256("") = e3b0c442...
        let addr = address_of(b"");
        assert_eq!(addr.as_bytes()[..4], [0x12, 0x20, 0xe3, 0xb0]);
        assert_eq!(
            addr.to_base58(),
            "QmdfTbBqBPQ7VNxZEYEj14VmRuZBkqFbiwReogJgS1zR1n"
        );
    }

    #[test]
    fn base58_starts_with_qm() {
        let addr = address_of(b"hello mist");
        assert!(addr.to_base58().starts_with("Qm"));
    }

    #[test]
    fn verify_detects_changes() {
        let addr = address_of(b"block contents");
        assert!(verify(&addr, b"block contents"));
        assert!(!verify(&addr, b"block content"));
        assert!(!verify(&Address::NULL, b""));
    }

    #[test]
    fn different_content_different_address() {
        assert_ne!(address_of(b"foo"), address_of(b"bar"));
    }
}
