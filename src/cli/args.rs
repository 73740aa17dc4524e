use crate::core::LedgerConfig;
use crate::sync::SyncConfig;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Serve the banking ledger over HTTP
#[derive(Parser, Debug)]
#[command(name = "banking-ledger")]
#[command(about = "Banking ledger with per-account undo/redo, audit trail and secondary-store sync", long_about = None)]
pub struct ServerArgs {
    /// Address the HTTP server listens on
    #[arg(
        long = "bind",
        env = "LEDGER_BIND",
        value_name = "ADDR",
        default_value = "0.0.0.0:8080"
    )]
    pub bind: SocketAddr,

    /// Number of runtime worker threads
    #[arg(
        long = "workers",
        env = "LEDGER_WORKERS",
        value_name = "COUNT",
        help = "Runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Maximum undo history per account
    #[arg(
        long = "undo-depth",
        env = "LEDGER_UNDO_DEPTH",
        value_name = "DEPTH",
        default_value_t = 0,
        help = "Maximum undo history per account (0 = unbounded)"
    )]
    pub undo_depth: usize,

    /// How long an operation waits for an account lock
    #[arg(
        long = "lock-timeout-ms",
        env = "LEDGER_LOCK_TIMEOUT_MS",
        value_name = "MILLIS",
        default_value_t = 5000
    )]
    pub lock_timeout_ms: u64,

    /// Attempts per secondary-store write
    #[arg(
        long = "sync-max-attempts",
        env = "LEDGER_SYNC_MAX_ATTEMPTS",
        value_name = "COUNT",
        default_value_t = 3
    )]
    pub sync_max_attempts: u32,

    /// Delay before the first secondary-store retry
    #[arg(
        long = "sync-initial-backoff-ms",
        env = "LEDGER_SYNC_INITIAL_BACKOFF_MS",
        value_name = "MILLIS",
        default_value_t = 100
    )]
    pub sync_initial_backoff_ms: u64,

    /// Directory for the CSV secondary store
    #[arg(
        long = "secondary-dir",
        env = "LEDGER_SECONDARY_DIR",
        value_name = "DIR",
        help = "Write the secondary store as CSV files in DIR (default: in-memory)"
    )]
    pub secondary_dir: Option<PathBuf>,

    /// Forward audit entries to the secondary store as they are written
    #[arg(long = "mirror-audit", env = "LEDGER_MIRROR_AUDIT")]
    pub mirror_audit: bool,

    /// Create three demo customers with funded accounts at startup
    #[arg(long = "seed-sample-data", env = "LEDGER_SEED_SAMPLE_DATA")]
    pub seed_sample_data: bool,

    /// Log output format
    #[arg(
        long = "log-format",
        env = "LEDGER_LOG_FORMAT",
        value_name = "FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,
}

/// Available log output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ServerArgs {
    /// Worker thread count, defaulting to the number of CPU cores
    pub fn worker_threads(&self) -> usize {
        match self.workers {
            Some(0) | None => num_cpus::get(),
            Some(n) => n,
        }
    }

    /// Create a LedgerConfig from CLI arguments
    ///
    /// A zero lock timeout falls back to the default with a warning.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(self.undo_depth, self.lock_timeout_ms)
    }

    /// Create a SyncConfig from CLI arguments
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.sync_max_attempts, self.sync_initial_backoff_ms)
    }
}
