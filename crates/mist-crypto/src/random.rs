//! Operating-system randomness for per-archive salts and nonces

use rand::rngs::OsRng;
use rand::RngCore;

use mist_core::{MistError, MistResult};

use crate::{Nonce, Salt, NONCE_SIZE, SALT_SIZE};

/// Fresh random values drawn once per vaporize.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveSecrets {
    pub salt: Salt,
    pub file_nonce: Nonce,
    pub table_nonce: Nonce,
}

impl std::fmt::Debug for ArchiveSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSecrets").finish_non_exhaustive()
    }
}

/// Fill `buf` from the OS CSPRNG. Never falls back to a weaker source.
pub fn fill_random(buf: &mut [u8]) -> MistResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| MistError::Randomness(e.to_string()))
}

/// Draw 64 random bytes: salt (32) || file nonce (16) || table nonce (16).
pub fn fresh_secrets() -> MistResult<ArchiveSecrets> {
    let mut raw = [0u8; SALT_SIZE + 2 * NONCE_SIZE];
    fill_random(&mut raw)?;

    let mut secrets = ArchiveSecrets {
        salt: [0u8; SALT_SIZE],
        file_nonce: [0u8; NONCE_SIZE],
        table_nonce: [0u8; NONCE_SIZE],
    };
    secrets.salt.copy_from_slice(&raw[..SALT_SIZE]);
    secrets
        .file_nonce
        .copy_from_slice(&raw[SALT_SIZE..SALT_SIZE + NONCE_SIZE]);
    secrets
        .table_nonce
        .copy_from_slice(&raw[SALT_SIZE + NONCE_SIZE..]);
    Ok(secrets)
}
