//! IPFS daemon block store over the Kubo HTTP API
//!
//! `block/put` with `mhtype=sha2-256&format=v0` stores raw bytes and answers
//! with the CIDv0 text, whose decoded bytes are the 34-byte multihash used as
//! [`Address`] everywhere else.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use mist_core::{Address, MistError, MistResult};

use crate::traits::BlockStore;

/// Largest block the daemon accepts through `block/put`.
pub const IPFS_BLOCK_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct BlockPutResponse {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct IpfsStore {
    client: reqwest::Client,
    api: String,
    max_block_size: usize,
}

impl IpfsStore {
    /// Client for the API at `api` (e.g. `http://127.0.0.1:5001`).
    pub fn new(api: &str, timeout: Duration, max_block_size: usize) -> MistResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MistError::Config(format!("building IPFS HTTP client: {e}")))?;
        Ok(Self {
            client,
            api: api.trim_end_matches('/').to_string(),
            max_block_size: max_block_size.min(IPFS_BLOCK_LIMIT),
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{command}", self.api)
    }
}

/// Turn a non-success API response into a store error.
async fn api_failure(resp: reqwest::Response, subject: &str) -> MistError {
    let status = resp.status();
    let message = match resp.json::<ApiError>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        _ => status.to_string(),
    };
    if message.contains("not found") || status == reqwest::StatusCode::NOT_FOUND {
        MistError::NotFound(subject.to_string())
    } else {
        MistError::StoreUnavailable(format!("ipfs: {subject}: {message}"))
    }
}

fn unreachable_err(e: reqwest::Error) -> MistError {
    MistError::StoreUnavailable(format!("ipfs daemon unreachable: {e}"))
}

#[async_trait]
impl BlockStore for IpfsStore {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        if block.len() > self.max_block_size {
            return Err(MistError::BlockTooLarge {
                size: block.len(),
                limit: self.max_block_size,
            });
        }

        let form = Form::new().part("data", Part::bytes(block.to_vec()).file_name("data"));
        let resp = self
            .client
            .post(self.endpoint("block/put"))
            .query(&[("mhtype", "sha2-256"), ("format", "v0")])
            .multipart(form)
            .send()
            .await
            .map_err(unreachable_err)?;

        if !resp.status().is_success() {
            return Err(api_failure(resp, "block/put").await);
        }

        let body: BlockPutResponse = resp
            .json()
            .await
            .map_err(|e| MistError::StoreUnavailable(format!("ipfs: bad block/put reply: {e}")))?;
        let address = Address::from_base58(&body.key)
            .map_err(|e| MistError::StoreUnavailable(format!("ipfs: unexpected key {}: {e}", body.key)))?;

        tracing::debug!(%address, bytes = block.len(), "block stored in ipfs");
        Ok(address)
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        let b58 = address.to_base58();
        let resp = self
            .client
            .post(self.endpoint("block/get"))
            .query(&[("arg", b58.as_str())])
            .send()
            .await
            .map_err(unreachable_err)?;

        if !resp.status().is_success() {
            return Err(api_failure(resp, &b58).await);
        }

        let data = resp
            .bytes()
            .await
            .map_err(|e| MistError::StoreUnavailable(format!("ipfs: reading block {b58}: {e}")))?
            .to_vec();

        if !mist_chunks::verify(address, &data) {
            return Err(MistError::CorruptBlock(b58));
        }
        Ok(data)
    }
}
