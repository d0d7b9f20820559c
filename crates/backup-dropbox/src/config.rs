//! Backup Dropbox config
//!

use core::num::NonZeroUsize;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use shared::Failure;
use thiserror::Error;

use crate::DatePattern;

/// The sync's config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The directory holding the local backups.
    pub backup_dir: PathBuf,

    /// The prefixes of the backup series to sync, processed in order.
    pub file_prefix_to_backup: Vec<String>,

    /// The pattern of the date that directly follows the prefix in a backup's file name.
    pub date_format: DatePattern,

    /// Identifies this client to Dropbox.
    pub dropbox_client_identifier: String,

    /// The Dropbox access token.
    pub dropbox_token: String,

    /// The number of backups to keep in Dropbox for each prefix.
    pub number_of_days_to_keep: NonZeroUsize,
}

impl Config {
    /// Tries to load a config from a toml file.
    pub fn load_toml(file_path: PathBuf) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let contents = fs::read_to_string(file_path).map_err(LoadConfigError::Read)?;

        Self::from_toml(&contents)
    }

    /// Tries to parse and validate a config from toml.
    pub fn from_toml(contents: &str) -> Result<Self, LoadConfigError> {
        let config: Self = toml::from_str(contents)?;

        if config.file_prefix_to_backup.iter().any(String::is_empty) {
            return Err(LoadConfigError::EmptyPrefix);
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("./backups"),
            file_prefix_to_backup: vec!["db_dump_".to_string()],
            date_format: DatePattern::new("yyyy-MM-dd_HH-mm")
                .or_log_and_panic("Default date pattern must be valid"),
            dropbox_client_identifier: "backup-dropbox".to_string(),
            dropbox_token: String::new(),
            number_of_days_to_keep: NonZeroUsize::MIN.saturating_add(6),
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("A prefix in file_prefix_to_backup is empty, it would match every file")]
    EmptyPrefix,
}
