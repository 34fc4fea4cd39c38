//! Symmetric key type and HKDF domain separation for the sealed format

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use mist_core::{MistError, MistResult};

use crate::KEY_SIZE;

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, failing with `InvalidKeySize` on wrong width.
    pub fn from_slice(bytes: &[u8]) -> MistResult<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| MistError::InvalidKeySize {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes: arr })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Expand `key` into an independent key for `domain` via HKDF-SHA256.
pub fn derive_sealing_key(key: &SymmetricKey, domain: &[u8]) -> MistResult<SymmetricKey> {
    let hkdf = Hkdf::<Sha256>::new(None, key.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(domain, &mut okm)
        .map_err(|e| MistError::Other(anyhow::anyhow!("HKDF expand failed: {e}")))?;
    let derived = SymmetricKey::from_bytes(okm);
    okm.zeroize();
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_wrong_size() {
        let err = SymmetricKey::from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            MistError::InvalidKeySize {
                expected: 32,
                actual: 16
            }
        ));
        assert!(SymmetricKey::from_slice(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_debug_redacts() {
        let key = SymmetricKey::from_bytes([0x41u8; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("65"));
    }

    #[test]
    fn test_hkdf_derive_different_domains() {
        let key = SymmetricKey::from_bytes([42u8; KEY_SIZE]);
        let a = derive_sealing_key(&key, b"mist-sealed-blocks").unwrap();
        let b = derive_sealing_key(&key, b"mist-sealed-table").unwrap();

        assert_ne!(a.as_bytes(), b.as_bytes(), "different domains must produce different keys");
        assert_ne!(a.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_hkdf_derive_deterministic() {
        let key = SymmetricKey::from_bytes([9u8; KEY_SIZE]);
        let a = derive_sealing_key(&key, b"domain").unwrap();
        let b = derive_sealing_key(&key, b"domain").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
