//! Remote storage for the backups.
//!

use core::num::TryFromIntError;
use std::io::{self, Read};

use thiserror::Error;

mod dropbox;
mod memory;

pub use dropbox::Dropbox;
pub use memory::{Call, MemoryStorage};

/// The operations the sync needs from a remote storage.
pub trait RemoteStorage {
    /// List a page of entries in the root folder, continuing from `cursor` if given.
    fn list(&mut self, cursor: Option<&str>) -> Result<ListPage, StorageError>;

    /// Upload the contents of `reader` to `path`.
    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<(), StorageError>;

    /// Delete the entry at `path`.
    fn delete(&mut self, path: &str) -> Result<(), StorageError>;
}

/// An entry in the remote storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// The absolute remote path, e.g. `/db_20230101.sql`.
    pub path: String,
}

impl RemoteEntry {
    /// Create an entry from its remote path.
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into() }
    }

    /// The path without its leading slash.
    pub fn name(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }
}

/// A page of a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// The entries in this page.
    pub entries: Vec<RemoteEntry>,

    /// If another page follows.
    pub has_more: bool,

    /// The cursor to request the next page with.
    pub cursor: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to send request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {endpoint} failed with status {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error("Failed to serialize request argument: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Upload was larger than u64::MAX: {0}")]
    TooLarge(#[from] TryFromIntError),

    #[error("Listing reported more entries without a cursor")]
    MissingCursor,

    #[error("Storage rejected the request: {0}")]
    Rejected(String),
}
