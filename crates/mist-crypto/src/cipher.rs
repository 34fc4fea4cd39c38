//! AES-256-CTR cipher session
//!
//! A session is stateful: the keystream position advances with every call,
//! so applying it to `a` then `b` yields the same bytes as applying it once
//! to `a || b`. Encryption and decryption are the same operation.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

use mist_core::{MistError, MistResult};

use crate::{Nonce, KEY_SIZE};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

pub struct CipherSession {
    inner: Aes256Ctr,
    position: u64,
}

impl CipherSession {
    /// Start a keystream at counter block `nonce` under `key`.
    pub fn new(key: &[u8], nonce: &Nonce) -> MistResult<Self> {
        if key.len() != KEY_SIZE {
            return Err(MistError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }
        let inner = Aes256Ctr::new(key.into(), nonce.as_slice().into());
        Ok(Self { inner, position: 0 })
    }

    /// XOR `input` with the next `input.len()` keystream bytes.
    pub fn apply(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = input.to_vec();
        self.apply_in_place(&mut out);
        out
    }

    pub fn apply_in_place(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
        self.position += buf.len() as u64;
    }

    /// Keystream bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl std::fmt::Debug for CipherSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherSession")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
