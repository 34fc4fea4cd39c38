use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MistError, MistResult};

/// Width of a content address: a sha2-256 multihash (2-byte prefix + digest).
pub const ADDRESS_SIZE: usize = 34;

/// Opaque, fixed-width identifier the block store assigns to a block.
///
/// Rendered as base58 text for display and CLI input, which makes a
/// sha2-256 address read the same as an IPFS CIDv0 (`Qm…`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// All-zero "no predecessor" sentinel used by the chain layout.
    pub const NULL: Address = Address([0u8; ADDRESS_SIZE]);

    pub fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, failing when the width is wrong.
    pub fn from_slice(bytes: &[u8]) -> MistResult<Self> {
        let arr: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            MistError::MalformedRecord(format!(
                "address must be {ADDRESS_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_base58(text: &str) -> MistResult<Self> {
        let bytes = bs58::decode(text.trim())
            .into_vec()
            .map_err(|e| MistError::InvalidIdentifier(format!("'{text}': {e}")))?;
        let arr: [u8; ADDRESS_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            MistError::InvalidIdentifier(format!(
                "'{text}' decodes to {} bytes, expected {ADDRESS_SIZE}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = MistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

/// On-store archive layout. Each variant has its own header encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// v1: AES-256-CTR data stream + encrypted block table, no integrity tag
    #[default]
    Ctr,
    /// v2: XChaCha20-Poly1305 per block and for the table
    Sealed,
    /// v3: blocks chained by predecessor address, no table
    Chain,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Ctr => "ctr",
            ArchiveFormat::Sealed => "sealed",
            ArchiveFormat::Chain => "chain",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = MistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctr" => Ok(ArchiveFormat::Ctr),
            "sealed" => Ok(ArchiveFormat::Sealed),
            "chain" => Ok(ArchiveFormat::Chain),
            other => Err(MistError::Config(format!(
                "unknown archive format '{other}' (expected ctr, sealed or chain)"
            ))),
        }
    }
}
