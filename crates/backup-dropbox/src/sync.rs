use std::{
    collections::HashSet,
    fs::File,
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    Config, Context, InvalidDateFormat, dated_files,
    listing::{ListLocalError, list_local, list_remote},
    retention::select_deletions,
    storage::{RemoteEntry, RemoteStorage, StorageError},
    upload::select_upload,
};

/// What a sync changed in the remote storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The remote paths that were deleted.
    pub deleted: Vec<String>,

    /// The local files that were uploaded.
    pub uploaded: Vec<PathBuf>,
}

/// Sync every configured prefix to the remote storage.
///
/// For each prefix, in config order, the remote backups over the retention limit are deleted
/// then the newest local backup is uploaded. The first failure stops the sync, prefixes after it
/// are left untouched.
pub fn sync<Storage: RemoteStorage + ?Sized>(
    config: &Config,
    storage: &mut Storage,
) -> Result<SyncReport, SyncError> {
    let start = Instant::now();
    let mut context = Context {
        prefix: None,
        current_context: "List",
    };

    let local = list_local(&config.backup_dir)?;
    let remote = list_remote(storage).map_err(SyncError::RemoteList)?;
    info!(
        "{context}Found {} local and {} remote entries",
        local.len(),
        remote.len()
    );

    let mut report = SyncReport::default();
    for prefix in &config.file_prefix_to_backup {
        context.prefix = Some(prefix.clone());
        sync_prefix(
            &mut context,
            config,
            storage,
            prefix,
            &local,
            &remote,
            &mut report,
        )?;
    }

    context.prefix = None;
    context.current_context = "Done";
    info!(
        "{context}Synchronization with Dropbox took {} ms",
        start.elapsed().as_millis()
    );

    Ok(report)
}

/// Apply retention then upload for a single prefix.
fn sync_prefix<Storage: RemoteStorage + ?Sized>(
    context: &mut Context,
    config: &Config,
    storage: &mut Storage,
    prefix: &str,
    local: &[PathBuf],
    remote: &[RemoteEntry],
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    // Retention
    let present = {
        context.current_context = "Retention";

        let backups = dated_files(
            remote
                .iter()
                .map(|entry| (entry.path.as_str(), entry.name().to_string())),
            prefix,
            &config.date_format,
        )?;
        info!("{context}{} backups detected", backups.len());

        let mut present: HashSet<String> =
            backups.iter().map(|backup| backup.name.clone()).collect();

        for backup in select_deletions(backups, config.number_of_days_to_keep) {
            storage
                .delete(backup.id)
                .map_err(|source| SyncError::Delete {
                    path: backup.id.to_string(),
                    source,
                })?;

            info!("{context}Deleted {}", backup.id);
            present.remove(&backup.name);
            report.deleted.push(backup.id.to_string());
        }

        present
    };

    // Upload
    {
        context.current_context = "Upload";

        let candidates = local.iter().filter_map(|path| {
            let name = path.file_name()?;
            match name.to_str() {
                Some(name) => Some((path.as_path(), name.to_string())),
                None => {
                    warn!("{context}Skipping non unicode file name {path:?}");
                    None
                }
            }
        });
        let backups = dated_files(candidates, prefix, &config.date_format)?;

        let Some(newest) = select_upload(backups) else {
            info!("{context}No local backup to upload");
            return Ok(());
        };

        if present.contains(&newest.name) {
            info!("{context}{} is already uploaded", newest.name);
            return Ok(());
        }

        upload_file(storage, newest.id, &format!("/{}", newest.name))?;

        info!("{context}Uploaded {:?}", newest.id);
        report.uploaded.push(newest.id.to_path_buf());
    }

    Ok(())
}

/// Stream a local file to the remote path, the file is closed whether or not the upload succeeds.
fn upload_file<Storage: RemoteStorage + ?Sized>(
    storage: &mut Storage,
    path: &Path,
    remote_path: &str,
) -> Result<(), SyncError> {
    let mut file = File::open(path).map_err(|source| SyncError::OpenLocal {
        path: path.to_path_buf(),
        source,
    })?;

    storage
        .upload(remote_path, &mut file)
        .map_err(|source| SyncError::Upload {
            path: path.to_path_buf(),
            source,
        })
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to list local backups: {0}")]
    ListLocal(#[from] ListLocalError),

    #[error("Failed to list remote backups: {0}")]
    RemoteList(#[source] StorageError),

    #[error("The date_format in the config is invalid: {0}")]
    InvalidDate(#[from] InvalidDateFormat),

    #[error("Failed to delete '{path}': {source}")]
    Delete { path: String, source: StorageError },

    #[error("Failed to open {path:?}: {source}")]
    OpenLocal { path: PathBuf, source: io::Error },

    #[error("Failed to upload {path:?}: {source}")]
    Upload { path: PathBuf, source: StorageError },
}
