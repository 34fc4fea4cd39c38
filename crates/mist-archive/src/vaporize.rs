//! Write path: file bytes → encrypted blocks → table → header
//!
//! The returned header address is the only thing needed (with the
//! passphrase) to recover the data. Blocks written before a failure are not
//! removed; the store has no delete and they are unreachable without a header.

use std::path::Path;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use mist_core::{Address, ArchiveFormat, MistResult};
use mist_crypto::{
    derive_keys, derive_sealing_key, fresh_secrets, seal_block, ArchiveSecrets, CipherSession,
    KeyPair, TABLE_INDEX,
};
use mist_store::BlockStore;

use crate::chain;
use crate::options::ArchiveOptions;
use crate::records::{encode_addresses, BlockTable, ChainHeader, Header, SealedHeader};
use crate::{ProgressFn, SEALED_BLOCKS_DOMAIN, SEALED_TABLE_DOMAIN};

/// Where a vaporize run is, or where it stopped.
///
/// `chain` archives have no table, so they go from `DataStored` straight to
/// `HeaderStored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    RandomnessGenerated,
    KeysDerived,
    DataStored,
    TableBuilt,
    TableStored,
    HeaderStored,
    Done,
    Failed,
}

/// Outcome of a successful vaporize
#[derive(Debug, Clone)]
pub struct VaporizeReport {
    /// Archive identifier
    pub header: Address,
    /// Table block; `None` for `chain` archives
    pub table: Option<Address>,
    pub data_blocks: usize,
    pub bytes: u64,
    pub format: ArchiveFormat,
}

pub struct Vaporizer<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    options: ArchiveOptions,
    progress: Option<ProgressFn>,
    stage: Stage,
    written: Vec<Address>,
}

impl<'a, S: BlockStore + ?Sized> Vaporizer<'a, S> {
    pub fn new(store: &'a S, options: ArchiveOptions) -> Self {
        Self {
            store,
            options,
            progress: None,
            stage: Stage::Init,
            written: Vec::new(),
        }
    }

    /// Report `(blocks done, blocks total, message)` after each data block.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Blocks left in the store by the last failed run. Empty otherwise.
    pub fn orphans(&self) -> &[Address] {
        if self.stage == Stage::Failed {
            &self.written
        } else {
            &[]
        }
    }

    /// Publish `data` and return the archive's header address.
    ///
    /// The first failure aborts the run and leaves the stage at `Failed`.
    pub async fn run(
        &mut self,
        passphrase: &SecretString,
        data: &[u8],
    ) -> MistResult<VaporizeReport> {
        self.stage = Stage::Init;
        self.written.clear();

        match self.execute(passphrase, data).await {
            Ok(report) => {
                self.stage = Stage::Done;
                info!(
                    id = %report.header,
                    format = %report.format,
                    blocks = report.data_blocks,
                    bytes = report.bytes,
                    "vaporized"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    stage = ?self.stage,
                    orphans = self.written.len(),
                    error = %e,
                    "vaporize aborted"
                );
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    /// Read `path` fully into memory and publish it.
    ///
    /// An unreadable file fails with `Io` before anything is written.
    pub async fn run_file(
        &mut self,
        passphrase: &SecretString,
        path: &Path,
    ) -> MistResult<VaporizeReport> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            std::io::Error::new(e.kind(), format!("reading {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = data.len(), "read source file");
        self.run(passphrase, &data).await
    }

    async fn execute(
        &mut self,
        passphrase: &SecretString,
        data: &[u8],
    ) -> MistResult<VaporizeReport> {
        let secrets = fresh_secrets()?;
        self.stage = Stage::RandomnessGenerated;

        let keys = derive_keys(passphrase, &secrets.salt)?;
        self.stage = Stage::KeysDerived;

        let chunks = mist_chunks::split(data, self.options.block_size);
        debug!(
            bytes = data.len(),
            blocks = chunks.len(),
            block_size = self.options.block_size.get(),
            format = %self.options.format,
            "vaporizing"
        );

        let (header, table) = match self.options.format {
            ArchiveFormat::Ctr => self.write_ctr(&secrets, &keys, &chunks).await?,
            ArchiveFormat::Sealed => self.write_sealed(&secrets, &keys, &chunks).await?,
            ArchiveFormat::Chain => (self.write_chain(&secrets, &keys, &chunks).await?, None),
        };

        Ok(VaporizeReport {
            header,
            table,
            data_blocks: chunks.len(),
            bytes: data.len() as u64,
            format: self.options.format,
        })
    }

    async fn write_ctr(
        &mut self,
        secrets: &ArchiveSecrets,
        keys: &KeyPair,
        chunks: &[&[u8]],
    ) -> MistResult<(Address, Option<Address>)> {
        // one session for the whole stream: the keystream must not restart per block
        let mut session = CipherSession::new(keys.file.as_bytes(), &secrets.file_nonce)?;
        let mut blocks = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let ciphertext = session.apply(chunk);
            blocks.push(self.put(&ciphertext).await?);
            self.report(i, chunks.len());
        }
        self.stage = Stage::DataStored;

        let table = BlockTable {
            nonce: secrets.file_nonce,
            blocks,
        }
        .encode()?;
        self.stage = Stage::TableBuilt;

        let sealed_table =
            CipherSession::new(keys.table.as_bytes(), &secrets.table_nonce)?.apply(&table);
        let table_addr = self.put(&sealed_table).await?;
        self.stage = Stage::TableStored;

        let header = Header {
            salt: secrets.salt,
            nonce: secrets.table_nonce,
            table: table_addr,
        };
        let header_addr = self.put(&header.encode()).await?;
        self.stage = Stage::HeaderStored;

        Ok((header_addr, Some(table_addr)))
    }

    async fn write_sealed(
        &mut self,
        secrets: &ArchiveSecrets,
        keys: &KeyPair,
        chunks: &[&[u8]],
    ) -> MistResult<(Address, Option<Address>)> {
        let block_key = derive_sealing_key(&keys.file, SEALED_BLOCKS_DOMAIN)?;
        let table_key = derive_sealing_key(&keys.table, SEALED_TABLE_DOMAIN)?;

        let mut blocks = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let sealed = seal_block(&block_key, i as u64, &secrets.salt, chunk)?;
            blocks.push(self.put(&sealed).await?);
            self.report(i, chunks.len());
        }
        self.stage = Stage::DataStored;

        let table = encode_addresses(&blocks)?;
        self.stage = Stage::TableBuilt;

        let sealed_table = seal_block(&table_key, TABLE_INDEX, &secrets.salt, &table)?;
        let table_addr = self.put(&sealed_table).await?;
        self.stage = Stage::TableStored;

        let header = SealedHeader {
            salt: secrets.salt,
            table: table_addr,
        };
        let header_addr = self.put(&header.encode()).await?;
        self.stage = Stage::HeaderStored;

        Ok((header_addr, Some(table_addr)))
    }

    async fn write_chain(
        &mut self,
        secrets: &ArchiveSecrets,
        keys: &KeyPair,
        chunks: &[&[u8]],
    ) -> MistResult<Address> {
        let mut session = CipherSession::new(keys.file.as_bytes(), &secrets.file_nonce)?;
        let mut prev = Address::NULL;
        for (i, chunk) in chunks.iter().enumerate() {
            let ciphertext = session.apply(chunk);
            prev = self.put(&chain::link(&prev, &ciphertext)).await?;
            self.report(i, chunks.len());
        }
        self.stage = Stage::DataStored;

        let header = ChainHeader {
            salt: secrets.salt,
            nonce: secrets.file_nonce,
            head: prev,
        };
        let header_addr = self.put(&header.encode()).await?;
        self.stage = Stage::HeaderStored;

        Ok(header_addr)
    }

    async fn put(&mut self, block: &[u8]) -> MistResult<Address> {
        let addr = self.store.put(block).await?;
        self.written.push(addr);
        debug!(block = %addr, bytes = block.len(), "block put");
        Ok(addr)
    }

    fn report(&self, index: usize, total: usize) {
        if let Some(cb) = &self.progress {
            cb(
                (index + 1) as u64,
                total as u64,
                &format!("block {}/{total}", index + 1),
            );
        }
    }
}

/// Vaporize an in-memory buffer.
pub async fn vaporize<S: BlockStore + ?Sized>(
    store: &S,
    passphrase: &SecretString,
    data: &[u8],
    options: ArchiveOptions,
) -> MistResult<VaporizeReport> {
    Vaporizer::new(store, options).run(passphrase, data).await
}

/// Read `path` fully into memory and vaporize it.
pub async fn vaporize_file<S: BlockStore + ?Sized>(
    store: &S,
    passphrase: &SecretString,
    path: &Path,
    options: ArchiveOptions,
) -> MistResult<VaporizeReport> {
    Vaporizer::new(store, options).run_file(passphrase, path).await
}
