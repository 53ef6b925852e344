use clap::Parser;
use parser::ErrorPolicy;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Feeds a Matrix chat dump into an AIL instance
#[derive(Parser, Debug)]
#[command(name = "matrix-feeder")]
#[command(about = "Parses a Matrix chat dump and submits every message to AIL")]
pub struct Cli {
    /// Path to the dump file
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,

    /// Path to the feeder configuration
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log and skip malformed records instead of aborting the batch
    #[arg(long = "skip-malformed")]
    pub skip_malformed: bool,

    /// Parse the dump and log each message's metadata without submitting
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl Cli {
    pub fn error_policy(&self) -> ErrorPolicy {
        if self.skip_malformed {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        }
    }
}
