//! Binary header and block-table records
//!
//! Layouts (all integers big-endian, all fields fixed width):
//! ```text
//! ctr header     [32 salt][16 table nonce][34 table address]              82 bytes
//! sealed header  ["MST" 0x02][32 salt][34 table address]                  70 bytes
//! chain header   ["MST" 0x03][32 salt][16 data nonce][34 head address]    86 bytes
//!
//! address list   [u32 count][34 address] × count
//! ctr table      [16 data nonce][address list]       (CTR-encrypted as a whole)
//! sealed table   [address list]                      (sealed as one block)
//! ```
//!
//! Decoding checks layout only. Nothing here can tell a correct table from
//! garbage that happens to parse.

use mist_core::{Address, ArchiveFormat, MistError, MistResult, ADDRESS_SIZE};
use mist_crypto::{Nonce, Salt, NONCE_SIZE, SALT_SIZE};

pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE + ADDRESS_SIZE;
pub const SEALED_HEADER_SIZE: usize = MAGIC_SIZE + SALT_SIZE + ADDRESS_SIZE;
pub const CHAIN_HEADER_SIZE: usize = MAGIC_SIZE + SALT_SIZE + NONCE_SIZE + ADDRESS_SIZE;

const MAGIC_SIZE: usize = 4;
const SEALED_MAGIC: [u8; MAGIC_SIZE] = *b"MST\x02";
const CHAIN_MAGIC: [u8; MAGIC_SIZE] = *b"MST\x03";
const COUNT_SIZE: usize = 4;

/// Unencrypted bootstrap record of a `ctr` archive.
///
/// `nonce` is the table's nonce; the data nonce lives inside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub salt: Salt,
    pub nonce: Nonce,
    pub table: Address,
}

impl Header {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(self.table.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> MistResult<Self> {
        expect_len("header", bytes, HEADER_SIZE)?;
        let (salt, rest) = bytes.split_at(SALT_SIZE);
        let (nonce, table) = rest.split_at(NONCE_SIZE);
        Ok(Self {
            salt: fixed(salt)?,
            nonce: fixed(nonce)?,
            table: Address::from_slice(table)?,
        })
    }
}

/// Ordered data-block addresses plus the data-stream nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTable {
    pub nonce: Nonce,
    pub blocks: Vec<Address>,
}

impl BlockTable {
    pub fn encode(&self) -> MistResult<Vec<u8>> {
        let list = encode_addresses(&self.blocks)?;
        let mut out = Vec::with_capacity(NONCE_SIZE + list.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&list);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> MistResult<Self> {
        if bytes.len() < NONCE_SIZE + COUNT_SIZE {
            return Err(MistError::MalformedRecord(format!(
                "table truncated: {} bytes (minimum {})",
                bytes.len(),
                NONCE_SIZE + COUNT_SIZE
            )));
        }
        let (nonce, list) = bytes.split_at(NONCE_SIZE);
        Ok(Self {
            nonce: fixed(nonce)?,
            blocks: decode_addresses(list)?,
        })
    }
}

/// Bootstrap record of a `sealed` archive. Nonces travel inside each sealed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedHeader {
    pub salt: Salt,
    pub table: Address,
}

impl SealedHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEALED_HEADER_SIZE);
        out.extend_from_slice(&SEALED_MAGIC);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(self.table.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> MistResult<Self> {
        expect_len("sealed header", bytes, SEALED_HEADER_SIZE)?;
        expect_magic(bytes, SEALED_MAGIC)?;
        let (salt, table) = bytes[MAGIC_SIZE..].split_at(SALT_SIZE);
        Ok(Self {
            salt: fixed(salt)?,
            table: Address::from_slice(table)?,
        })
    }
}

/// Bootstrap record of a `chain` archive: points at the last data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHeader {
    pub salt: Salt,
    pub nonce: Nonce,
    /// Last block of the chain, or [`Address::NULL`] for empty input
    pub head: Address,
}

impl ChainHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHAIN_HEADER_SIZE);
        out.extend_from_slice(&CHAIN_MAGIC);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(self.head.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> MistResult<Self> {
        expect_len("chain header", bytes, CHAIN_HEADER_SIZE)?;
        expect_magic(bytes, CHAIN_MAGIC)?;
        let (salt, rest) = bytes[MAGIC_SIZE..].split_at(SALT_SIZE);
        let (nonce, head) = rest.split_at(NONCE_SIZE);
        Ok(Self {
            salt: fixed(salt)?,
            nonce: fixed(nonce)?,
            head: Address::from_slice(head)?,
        })
    }
}

/// Any header, as found at an archive identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveHeader {
    Ctr(Header),
    Sealed(SealedHeader),
    Chain(ChainHeader),
}

impl ArchiveHeader {
    /// Decode by length first (82 bytes is always `ctr`), then by magic.
    pub fn decode(bytes: &[u8]) -> MistResult<Self> {
        match bytes.len() {
            HEADER_SIZE => Header::decode(bytes).map(Self::Ctr),
            SEALED_HEADER_SIZE => SealedHeader::decode(bytes).map(Self::Sealed),
            CHAIN_HEADER_SIZE => ChainHeader::decode(bytes).map(Self::Chain),
            n => Err(MistError::MalformedRecord(format!(
                "{n}-byte block is not an archive header"
            ))),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Ctr(h) => h.encode(),
            Self::Sealed(h) => h.encode(),
            Self::Chain(h) => h.encode(),
        }
    }

    pub fn format(&self) -> ArchiveFormat {
        match self {
            Self::Ctr(_) => ArchiveFormat::Ctr,
            Self::Sealed(_) => ArchiveFormat::Sealed,
            Self::Chain(_) => ArchiveFormat::Chain,
        }
    }

    pub fn salt(&self) -> &Salt {
        match self {
            Self::Ctr(h) => &h.salt,
            Self::Sealed(h) => &h.salt,
            Self::Chain(h) => &h.salt,
        }
    }
}

/// `[u32 count][address] × count`
pub fn encode_addresses(addresses: &[Address]) -> MistResult<Vec<u8>> {
    let count = u32::try_from(addresses.len()).map_err(|_| {
        MistError::MalformedRecord(format!("{} blocks do not fit a table", addresses.len()))
    })?;
    let mut out = Vec::with_capacity(COUNT_SIZE + addresses.len() * ADDRESS_SIZE);
    out.extend_from_slice(&count.to_be_bytes());
    for addr in addresses {
        out.extend_from_slice(addr.as_bytes());
    }
    Ok(out)
}

pub fn decode_addresses(bytes: &[u8]) -> MistResult<Vec<Address>> {
    if bytes.len() < COUNT_SIZE {
        return Err(MistError::MalformedRecord(format!(
            "address list truncated: {} bytes",
            bytes.len()
        )));
    }
    let (count, body) = bytes.split_at(COUNT_SIZE);
    let count = u32::from_be_bytes(fixed(count)?) as usize;

    if body.len() % ADDRESS_SIZE != 0 {
        return Err(MistError::MalformedRecord(format!(
            "address list body of {} bytes is not a multiple of {ADDRESS_SIZE}",
            body.len()
        )));
    }
    if body.len() / ADDRESS_SIZE != count {
        return Err(MistError::MalformedRecord(format!(
            "address list claims {count} entries but holds {}",
            body.len() / ADDRESS_SIZE
        )));
    }

    body.chunks_exact(ADDRESS_SIZE)
        .map(Address::from_slice)
        .collect()
}

fn expect_len(what: &str, bytes: &[u8], want: usize) -> MistResult<()> {
    if bytes.len() != want {
        return Err(MistError::MalformedRecord(format!(
            "{what} must be {want} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

fn expect_magic(bytes: &[u8], magic: [u8; MAGIC_SIZE]) -> MistResult<()> {
    if bytes[..MAGIC_SIZE] != magic {
        return Err(MistError::MalformedRecord(format!(
            "unknown header magic {:02x?}",
            &bytes[..MAGIC_SIZE]
        )));
    }
    Ok(())
}

fn fixed<const N: usize>(bytes: &[u8]) -> MistResult<[u8; N]> {
    bytes.try_into().map_err(|_| {
        MistError::MalformedRecord(format!("field must be {N} bytes, got {}", bytes.len()))
    })
}
