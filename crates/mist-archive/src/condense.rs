//! Read path: header → table → data blocks → plaintext
//!
//! Data blocks are independent in the store, so they are fetched with
//! bounded concurrency. Decryption is a separate pass in table order with
//! one continuous keystream.

use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};
use secrecy::SecretString;
use tracing::{debug, info};

use mist_core::{Address, MistResult};
use mist_crypto::{derive_keys, derive_sealing_key, open_block, CipherSession, TABLE_INDEX};
use mist_store::BlockStore;

use crate::chain;
use crate::options::ArchiveOptions;
use crate::records::{decode_addresses, ArchiveHeader, BlockTable, ChainHeader, Header, SealedHeader};
use crate::{ProgressFn, SEALED_BLOCKS_DOMAIN, SEALED_TABLE_DOMAIN};

pub struct Condenser<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    options: ArchiveOptions,
    progress: Option<ProgressFn>,
}

impl<'a, S: BlockStore + ?Sized> Condenser<'a, S> {
    pub fn new(store: &'a S, options: ArchiveOptions) -> Self {
        Self {
            store,
            options,
            progress: None,
        }
    }

    /// Report `(blocks fetched, blocks total, message)`. `chain` archives
    /// report a total of 0 because their length is unknown until the end.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Recover the bytes published under `id`.
    ///
    /// A wrong passphrase on a `ctr` archive usually fails with
    /// `MalformedRecord` at the table; if the garbage happens to parse, the
    /// result is not the original data. `sealed` archives fail with
    /// `Authentication`.
    pub async fn run(&self, passphrase: &SecretString, id: &Address) -> MistResult<Vec<u8>> {
        let header = ArchiveHeader::decode(&self.store.get(id).await?)?;
        debug!(%id, format = %header.format(), "header resolved");

        let data = match header {
            ArchiveHeader::Ctr(h) => self.read_ctr(passphrase, &h).await?,
            ArchiveHeader::Sealed(h) => self.read_sealed(passphrase, &h).await?,
            ArchiveHeader::Chain(h) => self.read_chain(passphrase, &h).await?,
        };

        info!(%id, bytes = data.len(), "condensed");
        Ok(data)
    }

    /// Condense into `out`, writing a temp file first and renaming it into
    /// place. Returns the number of bytes written.
    pub async fn run_to_file(
        &self,
        passphrase: &SecretString,
        id: &Address,
        out: &Path,
    ) -> MistResult<u64> {
        let data = self.run(passphrase, id).await?;

        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = out.with_extension("mist_tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, out).await?;

        debug!(path = %out.display(), bytes = data.len(), "written");
        Ok(data.len() as u64)
    }

    async fn read_ctr(&self, passphrase: &SecretString, header: &Header) -> MistResult<Vec<u8>> {
        let keys = derive_keys(passphrase, &header.salt)?;

        let sealed_table = self.store.get(&header.table).await?;
        let plain_table = CipherSession::new(keys.table.as_bytes(), &header.nonce)?
            .apply(&sealed_table);
        let table = BlockTable::decode(&plain_table)?;
        debug!(blocks = table.blocks.len(), "table decoded");

        let blocks = self.fetch_all(&table.blocks).await?;

        let mut session = CipherSession::new(keys.file.as_bytes(), &table.nonce)?;
        let mut out = Vec::with_capacity(blocks.iter().map(Vec::len).sum());
        for mut block in blocks {
            session.apply_in_place(&mut block);
            out.extend_from_slice(&block);
        }
        Ok(out)
    }

    async fn read_sealed(
        &self,
        passphrase: &SecretString,
        header: &SealedHeader,
    ) -> MistResult<Vec<u8>> {
        let keys = derive_keys(passphrase, &header.salt)?;
        let block_key = derive_sealing_key(&keys.file, SEALED_BLOCKS_DOMAIN)?;
        let table_key = derive_sealing_key(&keys.table, SEALED_TABLE_DOMAIN)?;

        let sealed_table = self.store.get(&header.table).await?;
        let table = open_block(&table_key, TABLE_INDEX, &header.salt, &sealed_table)?;
        let addresses = decode_addresses(&table)?;
        debug!(blocks = addresses.len(), "sealed table opened");

        let blocks = self.fetch_all(&addresses).await?;

        let mut out = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            out.extend(open_block(&block_key, i as u64, &header.salt, block)?);
        }
        Ok(out)
    }

    async fn read_chain(
        &self,
        passphrase: &SecretString,
        header: &ChainHeader,
    ) -> MistResult<Vec<u8>> {
        let keys = derive_keys(passphrase, &header.salt)?;
        let payloads = chain::walk(self.store, &header.head, self.progress.as_ref()).await?;
        debug!(blocks = payloads.len(), "chain walked");

        let mut session = CipherSession::new(keys.file.as_bytes(), &header.nonce)?;
        let mut out = Vec::with_capacity(payloads.iter().map(Vec::len).sum());
        for mut payload in payloads {
            session.apply_in_place(&mut payload);
            out.extend_from_slice(&payload);
        }
        Ok(out)
    }

    /// Fetch blocks, up to `fetch_concurrency` in flight, returned in table order.
    async fn fetch_all(&self, addresses: &[Address]) -> MistResult<Vec<Vec<u8>>> {
        let total = addresses.len();
        let concurrency = self.options.fetch_concurrency.max(1);

        stream::iter(addresses)
            .map(|addr| self.store.get(addr))
            .buffered(concurrency)
            .enumerate()
            .map(|(i, block)| {
                if let (Some(cb), Ok(_)) = (&self.progress, &block) {
                    cb(
                        (i + 1) as u64,
                        total as u64,
                        &format!("block {}/{total}", i + 1),
                    );
                }
                block
            })
            .try_collect()
            .await
    }
}

/// Recover the bytes published under `id`.
pub async fn condense<S: BlockStore + ?Sized>(
    store: &S,
    passphrase: &SecretString,
    id: &Address,
    options: ArchiveOptions,
) -> MistResult<Vec<u8>> {
    Condenser::new(store, options).run(passphrase, id).await
}

/// Condense into `out` through a temp file renamed into place.
pub async fn condense_to_file<S: BlockStore + ?Sized>(
    store: &S,
    passphrase: &SecretString,
    id: &Address,
    out: &Path,
    options: ArchiveOptions,
) -> MistResult<u64> {
    Condenser::new(store, options)
        .run_to_file(passphrase, id, out)
        .await
}
