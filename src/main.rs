//! Banking Ledger Server
//!
//! HTTP back-end for the banking ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --seed-sample-data
//! cargo run -- --bind 127.0.0.1:9000 --undo-depth 50 --log-format json
//! cargo run -- --secondary-dir ./secondary --mirror-audit
//! ```
//!
//! Every flag can also be set through a `LEDGER_*` environment variable.
//! Logging is filtered with `RUST_LOG` (default `info`).
//!
//! # Secondary Store
//!
//! - without `--secondary-dir`: an in-memory store that lives as long as the process
//! - with `--secondary-dir DIR`: one CSV file per table in `DIR`
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown (Ctrl-C)
//! - 1: Error (address in use, unwritable secondary directory, etc.)

use banking_ledger::api::{self, AppState};
use banking_ledger::cli::{self, ServerArgs};
use banking_ledger::core::{sample_data, AuditLogger, LedgerService};
use banking_ledger::observability;
use banking_ledger::sync::{
    spawn_audit_mirror, CsvSecondaryStore, InMemorySecondaryStore, SecondaryStore, Synchronizer,
};
use std::process;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

fn main() {
    let args = cli::parse_args();
    observability::init(args.log_format);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve(args)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn serve(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn SecondaryStore> = match &args.secondary_dir {
        Some(dir) => Arc::new(CsvSecondaryStore::open(dir)?),
        None => Arc::new(InMemorySecondaryStore::new()),
    };
    let sync_config = args.to_sync_config();

    let mut audit = AuditLogger::default();
    let mirror = if args.mirror_audit {
        let (tx, rx) = mpsc::unbounded_channel();
        audit = audit.with_mirror(tx);
        Some(spawn_audit_mirror(store.clone(), rx, sync_config.clone()))
    } else {
        None
    };

    let ledger = Arc::new(LedgerService::with_audit(args.to_ledger_config(), audit));
    if args.seed_sample_data {
        sample_data::seed(&ledger).await?;
    }

    let sync = Arc::new(Synchronizer::new(ledger.clone(), store, sync_config));
    let app = api::build_app(AppState::new(ledger, sync));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(address = %listener.local_addr()?, "Banking ledger listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = mirror {
        // The router owned the last sender; the mirror drains and exits.
        if let Err(e) = handle.await {
            warn!(error = %e, "Audit mirror task ended abnormally");
        }
    }
    info!("Banking ledger stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
