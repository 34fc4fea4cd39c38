//! Predecessor-linked block layout
//!
//! Each block is `[34 predecessor address][ciphertext]`. The first block's
//! predecessor is [`Address::NULL`] and the header points at the last block,
//! so reading walks backwards and must be serial.

use mist_core::{Address, MistError, MistResult, ADDRESS_SIZE};
use mist_store::BlockStore;

use crate::ProgressFn;

pub fn link(prev: &Address, ciphertext: &[u8]) -> Vec<u8> {
    let mut block = Vec::with_capacity(ADDRESS_SIZE + ciphertext.len());
    block.extend_from_slice(prev.as_bytes());
    block.extend_from_slice(ciphertext);
    block
}

/// Split a chain block into (predecessor, ciphertext).
pub fn unlink(block: &[u8]) -> MistResult<(Address, &[u8])> {
    if block.len() < ADDRESS_SIZE {
        return Err(MistError::MalformedRecord(format!(
            "chain block of {} bytes has no predecessor field",
            block.len()
        )));
    }
    let (prev, payload) = block.split_at(ADDRESS_SIZE);
    Ok((Address::from_slice(prev)?, payload))
}

/// Fetch the chain ending at `head` and return its payloads in write order.
pub async fn walk<S: BlockStore + ?Sized>(
    store: &S,
    head: &Address,
    progress: Option<&ProgressFn>,
) -> MistResult<Vec<Vec<u8>>> {
    let mut payloads = Vec::new();
    let mut cursor = *head;

    while !cursor.is_null() {
        let block = store.get(&cursor).await?;
        let (prev, payload) = unlink(&block)?;
        tracing::debug!(block = %cursor, index_from_end = payloads.len(), "chain block fetched");
        payloads.push(payload.to_vec());
        cursor = prev;

        if let Some(cb) = progress {
            let n = payloads.len() as u64;
            // total unknown until the sentinel is reached
            cb(n, 0, &format!("block {n}"));
        }
    }

    payloads.reverse();
    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_unlink() {
        let prev = Address::from_bytes([5u8; ADDRESS_SIZE]);
        let block = link(&prev, b"payload");
        assert_eq!(block.len(), ADDRESS_SIZE + 7);

        let (back, payload) = unlink(&block).unwrap();
        assert_eq!(back, prev);
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn first_block_points_at_sentinel() {
        let block = link(&Address::NULL, b"");
        let (prev, payload) = unlink(&block).unwrap();
        assert!(prev.is_null());
        assert!(payload.is_empty());
    }

    #[test]
    fn short_block_is_malformed() {
        assert!(matches!(
            unlink(&[0u8; 33]),
            Err(MistError::MalformedRecord(_))
        ));
    }
}
