//! mist-core: shared types, config schema, and error taxonomy

pub mod config;
pub mod error;
pub mod types;

pub use config::MistConfig;
pub use error::{MistError, MistResult};
pub use types::{Address, ArchiveFormat, ADDRESS_SIZE};
