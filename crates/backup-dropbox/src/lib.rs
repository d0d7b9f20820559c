//! # backup-dropbox
//! Sync dated local backups to Dropbox, keeping a bounded number of them for each prefix.
//!

mod config;
mod context;
mod date_pattern;
mod dated_file;
mod listing;
mod retention;
pub mod storage;
mod sync;
mod upload;

pub use config::{Config, LoadConfigError};
pub use context::Context;
pub use date_pattern::{DatePattern, InvalidDateFormat, PatternError};
pub use dated_file::{DatedFile, dated_files};
pub use listing::{ListLocalError, list_local, list_remote};
pub use retention::select_deletions;
pub use sync::{SyncError, SyncReport, sync};
pub use upload::select_upload;
