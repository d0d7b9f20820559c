use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use crate::storage::{RemoteEntry, RemoteStorage, StorageError};

/// List the regular files directly inside `directory`.
///
/// Only failing to open the directory is an error. Entries that cannot be read, such as dangling
/// symlinks, are skipped with a warning since they cannot be uploaded anyway.
pub fn list_local(directory: &Path) -> Result<Vec<PathBuf>, ListLocalError> {
    let entries = fs::read_dir(directory).map_err(|source| ListLocalError::DirectoryUnreadable {
        directory: directory.to_path_buf(),
        source,
    })?;

    let files = entries
        .filter_map(|entry| {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(error) => {
                    warn!("Could not read entry in {directory:?}: {error}");
                    return None;
                }
            };

            // Follows symlinks, a link to a backup is still a backup.
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!("Could not get entry {path:?} metadata: {error}");
                    return None;
                }
            };

            metadata.is_file().then_some(path)
        })
        .collect();

    Ok(files)
}

/// List every entry in the remote storage, following the cursor until the last page.
///
/// Entries are returned in the order the storage enumerates them.
pub fn list_remote<Storage: RemoteStorage + ?Sized>(
    storage: &mut Storage,
) -> Result<Vec<RemoteEntry>, StorageError> {
    let mut entries = Vec::new();
    let mut page = storage.list(None)?;

    loop {
        entries.append(&mut page.entries);

        if !page.has_more {
            break;
        }

        let cursor = page.cursor.take().ok_or(StorageError::MissingCursor)?;
        page = storage.list(Some(&cursor))?;
    }

    Ok(entries)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ListLocalError {
    #[error("Failed to read directory {directory:?}: {source}")]
    DirectoryUnreadable {
        directory: PathBuf,
        source: io::Error,
    },
}
