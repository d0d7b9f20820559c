//! # common
//!

#![allow(dead_code)]

pub mod http;

use core::num::NonZeroUsize;
use std::{fs, path::Path};

use backup_dropbox::{Config, DatePattern, DatedFile};
use chrono::{NaiveDate, NaiveDateTime};

/// A config syncing `prefixes` from `backup_dir` with a `yyyyMMdd` date.
pub fn test_config(backup_dir: &Path, prefixes: &[&str], keep: usize) -> Config {
    Config {
        backup_dir: backup_dir.to_path_buf(),
        file_prefix_to_backup: prefixes.iter().map(|prefix| prefix.to_string()).collect(),
        date_format: DatePattern::new("yyyyMMdd").unwrap(),
        dropbox_client_identifier: "test".to_string(),
        dropbox_token: String::new(),
        number_of_days_to_keep: NonZeroUsize::new(keep).unwrap(),
    }
}

/// Midnight on the given day.
pub fn day(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A dated file identified by its name.
pub fn dated(name: &str, timestamp: NaiveDateTime) -> DatedFile<String> {
    DatedFile {
        id: name.to_string(),
        name: name.to_lowercase(),
        timestamp,
    }
}

/// Write local backup files with their name as contents.
pub fn write_files(directory: &Path, names: &[&str]) {
    for name in names {
        fs::write(directory.join(name), name.as_bytes()).unwrap();
    }
}
