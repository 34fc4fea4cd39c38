//! Per-block XChaCha20-Poly1305 sealing for the `sealed` archive format
//!
//! Sealed block format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = block_index (8 bytes, big-endian) || archive salt (32 bytes)
//! ```
//!
//! The AAD binds each block to its position in one archive, so blocks cannot
//! be reordered or swapped between archives. The table is sealed under its
//! own key with index [`TABLE_INDEX`].

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};

use mist_core::{MistError, MistResult};

use crate::keys::SymmetricKey;
use crate::random::fill_random;
use crate::{SALT_SIZE, SEALED_NONCE_SIZE, TAG_SIZE};

/// Index used when sealing the block table.
pub const TABLE_INDEX: u64 = u64::MAX;

/// Seal one block. Returns `[nonce][ciphertext][tag]`.
pub fn seal_block(
    key: &SymmetricKey,
    index: u64,
    archive_id: &[u8; SALT_SIZE],
    plaintext: &[u8],
) -> MistResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; SEALED_NONCE_SIZE];
    fill_random(&mut nonce_bytes)?;
    let nonce = XNonce::from_slice(&nonce_bytes);

    let aad = build_aad(index, archive_id);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| MistError::Other(anyhow::anyhow!("block sealing failed: {e}")))?;

    let mut result = Vec::with_capacity(SEALED_NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Open one sealed block, verifying its tag against `index` and `archive_id`.
pub fn open_block(
    key: &SymmetricKey,
    index: u64,
    archive_id: &[u8; SALT_SIZE],
    sealed: &[u8],
) -> MistResult<Vec<u8>> {
    if sealed.len() < SEALED_NONCE_SIZE + TAG_SIZE {
        return Err(MistError::MalformedRecord(format!(
            "sealed block too short: {} bytes (minimum {})",
            sealed.len(),
            SEALED_NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(SEALED_NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let aad = build_aad(index, archive_id);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| {
            MistError::Authentication(format!(
                "block {index}: wrong passphrase, corrupted data, or block out of place"
            ))
        })
}

/// AAD: block_index (8 bytes BE) || archive salt (32 bytes)
fn build_aad(index: u64, archive_id: &[u8; SALT_SIZE]) -> [u8; 8 + SALT_SIZE] {
    let mut aad = [0u8; 8 + SALT_SIZE];
    aad[..8].copy_from_slice(&index.to_be_bytes());
    aad[8..].copy_from_slice(archive_id);
    aad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let k = key(1);
        let archive_id = [0xABu8; 32];
        let plaintext = b"hello, sealed world!";

        let sealed = seal_block(&k, 0, &archive_id, plaintext).unwrap();
        let opened = open_block(&k, 0, &archive_id, &sealed).unwrap();

        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn test_seal_open_empty() {
        let k = key(2);
        let archive_id = [0u8; 32];

        let sealed = seal_block(&k, 0, &archive_id, b"").unwrap();
        assert_eq!(sealed.len(), SEALED_NONCE_SIZE + TAG_SIZE);
        assert_eq!(open_block(&k, 0, &archive_id, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_open_wrong_key() {
        let archive_id = [0u8; 32];
        let sealed = seal_block(&key(1), 0, &archive_id, b"secret data").unwrap();

        let result = open_block(&key(2), 0, &archive_id, &sealed);
        assert!(matches!(result, Err(MistError::Authentication(_))));
    }

    #[test]
    fn test_open_wrong_index() {
        let k = key(3);
        let archive_id = [0u8; 32];
        let sealed = seal_block(&k, 0, &archive_id, b"secret data").unwrap();

        let result = open_block(&k, 1, &archive_id, &sealed);
        assert!(result.is_err(), "wrong index must fail (AAD mismatch)");
    }

    #[test]
    fn test_open_wrong_archive() {
        let k = key(4);
        let sealed = seal_block(&k, 0, &[0xAAu8; 32], b"secret data").unwrap();

        let result = open_block(&k, 0, &[0xBBu8; 32], &sealed);
        assert!(result.is_err(), "wrong archive id must fail (AAD mismatch)");
    }

    #[test]
    fn test_sealed_size() {
        let sealed = seal_block(&key(5), 7, &[0u8; 32], &vec![0u8; 1000]).unwrap();
        // nonce (24) + plaintext (1000) + tag (16)
        assert_eq!(sealed.len(), 24 + 1000 + 16);
    }

    #[test]
    fn test_tampered_ciphertext() {
        let k = key(6);
        let archive_id = [0u8; 32];

        let mut sealed = seal_block(&k, TABLE_INDEX, &archive_id, b"secret data").unwrap();
        sealed[25] ^= 0xFF;

        let result = open_block(&k, TABLE_INDEX, &archive_id, &sealed);
        assert!(matches!(result, Err(MistError::Authentication(_))));
    }

    #[test]
    fn test_truncated_block() {
        let result = open_block(&key(7), 0, &[0u8; 32], &[0u8; 20]);
        assert!(matches!(result, Err(MistError::MalformedRecord(_))));
    }
}
