use std::io::Read;

use super::{ListPage, RemoteEntry, RemoteStorage, StorageError};

/// A call made against a [`MemoryStorage`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(Option<String>),
    Upload(String),
    Delete(String),
}

/// Remote storage held in memory, pages its listing and records every call made.
#[derive(Debug)]
pub struct MemoryStorage {
    /// The stored files in enumeration order.
    pub files: Vec<(String, Vec<u8>)>,

    /// The maximum number of entries in a listing page.
    pub page_size: usize,

    /// Every call made, in order, including failed ones.
    pub calls: Vec<Call>,

    /// Calls that fail instead of running.
    pub failures: Vec<Call>,
}

impl MemoryStorage {
    /// The default listing page size.
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    /// Create an empty storage.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            calls: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Add a file at `path`.
    pub fn with_file<P: Into<String>>(mut self, path: P, contents: &[u8]) -> Self {
        self.files.push((path.into(), contents.to_vec()));
        self
    }

    /// Limit listing pages to `page_size` entries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make `call` fail.
    pub fn failing_on(mut self, call: Call) -> Self {
        self.failures.push(call);
        self
    }

    /// The stored paths in enumeration order.
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|(path, _)| path.as_str()).collect()
    }

    /// The contents stored at `path`.
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(stored, _)| stored == path)
            .map(|(_, contents)| contents.as_slice())
    }

    /// Record a call and fail it if requested.
    fn record(&mut self, call: Call) -> Result<(), StorageError> {
        let fails = self.failures.contains(&call);
        self.calls.push(call.clone());

        if fails {
            return Err(StorageError::Rejected(format!("{call:?}")));
        }

        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStorage for MemoryStorage {
    fn list(&mut self, cursor: Option<&str>) -> Result<ListPage, StorageError> {
        self.record(Call::List(cursor.map(str::to_string)))?;

        let start = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| StorageError::Rejected(format!("unknown cursor '{cursor}'")))?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(self.files.len());

        let entries = self
            .files
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|(path, _)| RemoteEntry::new(path.as_str()))
            .collect();

        let has_more = end < self.files.len();
        Ok(ListPage {
            entries,
            has_more,
            cursor: has_more.then(|| end.to_string()),
        })
    }

    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<(), StorageError> {
        self.record(Call::Upload(path.to_string()))?;

        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| StorageError::Io(e, "read upload"))?;

        match self.files.iter_mut().find(|(stored, _)| stored == path) {
            Some((_, stored)) => *stored = contents,
            None => self.files.push((path.to_string(), contents)),
        }

        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), StorageError> {
        self.record(Call::Delete(path.to_string()))?;

        let Some(index) = self.files.iter().position(|(stored, _)| stored == path) else {
            return Err(StorageError::Rejected(format!("'{path}' not found")));
        };
        self.files.remove(index);

        Ok(())
    }
}
