//! mist-crypto: passphrase-derived confidentiality for archived blocks
//!
//! Key schedule:
//! ```text
//! (passphrase, salt[32]) ──PBKDF2-HMAC-SHA256, 4096 rounds, 64 bytes──┐
//!   ├── bytes[0..32]  → file key   (AES-256-CTR over the data stream)
//!   └── bytes[32..64] → table key  (AES-256-CTR over the block table)
//!
//! sealed format only:
//!   file key  ──HKDF-SHA256("mist-sealed-blocks")──→ XChaCha20-Poly1305 block key
//!   table key ──HKDF-SHA256("mist-sealed-table")───→ XChaCha20-Poly1305 table key
//! ```

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod random;
pub mod seal;

pub use cipher::CipherSession;
pub use kdf::{derive_keys, KeyPair};
pub use keys::{derive_sealing_key, SymmetricKey};
pub use random::{fill_random, fresh_secrets, ArchiveSecrets};
pub use seal::{open_block, seal_block, TABLE_INDEX};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the per-archive KDF salt
pub const SALT_SIZE: usize = 32;

/// Size of an AES-CTR initial counter block
pub const NONCE_SIZE: usize = 16;

/// PBKDF2 work factor. Fixed: archives do not record it.
pub const PBKDF2_ROUNDS: u32 = 4096;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const SEALED_NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

pub type Salt = [u8; SALT_SIZE];
pub type Nonce = [u8; NONCE_SIZE];
