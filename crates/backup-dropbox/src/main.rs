//! # backup-dropbox
//! Uploads the newest local backup of each prefix to Dropbox and removes the oldest remote ones.
//!

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{fs, path::PathBuf, process::ExitCode};

use backup_dropbox::{Config, storage::Dropbox, sync};
use mimalloc::MiMalloc;
use shared::{Failure, init_logger};
use tracing::{error, info};

fn main() -> ExitCode {
    let _logger = init_logger("backup-dropbox").or_log_and_panic("Could not initialise logger");

    // Initialize config if args include 'init'.
    if std::env::args().any(|arg| arg.eq("init")) {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write("config.toml", contents).or_log_and_panic("Could not create config file");
        return ExitCode::SUCCESS;
    }

    // Load config
    let config =
        Config::load_toml(PathBuf::from("./config.toml")).or_log_and_panic("Could not load config");

    // Create client
    let mut dropbox = Dropbox::new(&config.dropbox_client_identifier, &config.dropbox_token)
        .or_log_and_panic("Could not create Dropbox client");

    match sync(&config, &mut dropbox) {
        Ok(report) => {
            info!(
                "Deleted {} and uploaded {} backups",
                report.deleted.len(),
                report.uploaded.len()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("Synchronization failed: {error}");
            ExitCode::FAILURE
        }
    }
}
