use thiserror::Error;

pub type MistResult<T> = Result<T, MistError>;

#[derive(Debug, Error)]
pub enum MistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("block store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("block not found: {0}")]
    NotFound(String),

    #[error("block of {size} bytes exceeds the store limit of {limit} bytes")]
    BlockTooLarge { size: usize, limit: usize },

    /// The store returned bytes that do not hash to the requested address.
    #[error("block {0} does not match its content address")]
    CorruptBlock(String),

    #[error("secure randomness unavailable: {0}")]
    Randomness(String),

    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    /// Header or table bytes do not match the expected layout. A wrong
    /// passphrase on an unauthenticated archive usually surfaces here.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Sealed-format block or table failed its Poly1305 tag check.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid archive identifier: {0}")]
    InvalidIdentifier(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MistError {
    /// True for failures reported by the block store rather than by the
    /// local crypto or codec layers.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            MistError::StoreUnavailable(_)
                | MistError::NotFound(_)
                | MistError::BlockTooLarge { .. }
                | MistError::CorruptBlock(_)
        )
    }
}
