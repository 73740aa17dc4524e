//! Benchmark suite for ledger operations
//!
//! Measures the cost of the main write paths using the divan benchmarking
//! framework. Each benchmark drives the async service on a current-thread
//! tokio runtime.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use banking_ledger::core::LedgerConfig;
use banking_ledger::sync::{InMemorySecondaryStore, SyncConfig, Synchronizer};
use banking_ledger::types::{AccountType, CustomerProfile};
use banking_ledger::LedgerService;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn main() {
    divan::main();
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn open_accounts(ledger: &LedgerService, count: usize) -> Vec<String> {
    let mut numbers = Vec::with_capacity(count);
    for _ in 0..count {
        let customer = ledger
            .create_customer(CustomerProfile::default(), "bench")
            .await
            .unwrap();
        let account = ledger
            .open_account(&customer.customer_id, AccountType::Savings, "bench")
            .await
            .unwrap();
        ledger
            .deposit(&account.account_number, Decimal::new(1_000_000, 0), "", "bench")
            .await
            .unwrap();
        numbers.push(account.account_number);
    }
    numbers
}

/// Deposits spread over a set of accounts
#[divan::bench(args = [100, 1_000])]
fn deposits(bencher: divan::Bencher, operations: usize) {
    let rt = runtime();
    bencher
        .with_inputs(|| {
            let ledger = LedgerService::default();
            let accounts = rt.block_on(open_accounts(&ledger, 10));
            (ledger, accounts)
        })
        .bench_local_values(|(ledger, accounts)| {
            rt.block_on(async {
                for i in 0..operations {
                    let account = &accounts[i % accounts.len()];
                    ledger
                        .deposit(account, Decimal::ONE, "", "bench")
                        .await
                        .unwrap();
                }
            })
        });
}

/// Transfers around a ring of accounts
#[divan::bench(args = [100, 1_000])]
fn transfers(bencher: divan::Bencher, operations: usize) {
    let rt = runtime();
    bencher
        .with_inputs(|| {
            let ledger = LedgerService::default();
            let accounts = rt.block_on(open_accounts(&ledger, 10));
            (ledger, accounts)
        })
        .bench_local_values(|(ledger, accounts)| {
            rt.block_on(async {
                for i in 0..operations {
                    let from = &accounts[i % accounts.len()];
                    let to = &accounts[(i + 1) % accounts.len()];
                    ledger
                        .transfer(from, to, Decimal::ONE, "", "bench")
                        .await
                        .unwrap();
                }
            })
        });
}

/// Undo then redo of a deep history on one account
#[divan::bench(args = [100, 1_000])]
fn undo_redo_cycle(bencher: divan::Bencher, depth: usize) {
    let rt = runtime();
    bencher
        .with_inputs(|| {
            let ledger = LedgerService::new(LedgerConfig::default());
            let account = rt.block_on(async {
                let account = open_accounts(&ledger, 1).await.remove(0);
                for _ in 0..depth {
                    ledger
                        .deposit(&account, Decimal::ONE, "", "bench")
                        .await
                        .unwrap();
                }
                account
            });
            (ledger, account)
        })
        .bench_local_values(|(ledger, account)| {
            rt.block_on(async {
                for _ in 0..depth {
                    ledger.undo(&account, "bench", false).await.unwrap();
                }
                for _ in 0..depth {
                    ledger.redo(&account, "bench", false).await.unwrap();
                }
            })
        });
}

/// Full synchronization of a populated ledger into the in-memory store
#[divan::bench(args = [10, 100])]
fn full_sync(bencher: divan::Bencher, accounts: usize) {
    let rt = runtime();
    bencher
        .with_inputs(|| {
            let ledger = Arc::new(LedgerService::default());
            rt.block_on(open_accounts(&ledger, accounts));
            Synchronizer::new(
                ledger,
                Arc::new(InMemorySecondaryStore::new()),
                SyncConfig::default(),
            )
        })
        .bench_local_values(|sync| {
            rt.block_on(sync.sync_to_secondary()).unwrap();
        });
}
