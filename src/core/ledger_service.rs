//! Ledger service
//!
//! This module provides `LedgerService`, the entry point for every operation
//! that reads or changes ledger state.
//!
//! # Architecture
//!
//! ```text
//! LedgerService
//!     ├── LedgerStore      (account balances and metadata)
//!     ├── CustomerStore    (customer directory)
//!     ├── Journal          (append-only transaction records)
//!     ├── CommandEngine    (per-account undo/redo stacks)
//!     ├── AccountLocks     (per-account exclusive scopes)
//!     ├── AuditLogger      (audit trail)
//!     └── view lock        (RwLock separating commits from readers)
//! ```
//!
//! # Mutation protocol
//!
//! Every monetary mutation follows the same steps:
//!
//! 1. Validate the request and acquire the account lock(s) in sorted order.
//! 2. Stage the new account state on clones and draft the journal records.
//!    Any failure here leaves the ledger untouched.
//! 3. Append the SUCCESS audit entry. If the audit sink refuses, stop.
//! 4. Enter the commit section (exclusive side of the view lock) and write
//!    accounts, journal records and undo/redo stacks.
//!
//! Failures at steps 1 and 2 are recorded as FAILURE audit entries before
//! the error is returned.
//!
//! # Thread Safety
//!
//! The service is `Send + Sync` and meant to be shared behind an `Arc`.
//! Operations on different accounts proceed in parallel; operations on the
//! same account are serialised by its lock. Commit sections are short and
//! never await. Every read, [`LedgerService::snapshot`] included, takes the
//! shared side of the view lock, so no reader observes one half of a
//! transfer without the other.

use super::audit::AuditLogger;
use super::commands::Command;
use super::customer_store::CustomerStore;
use super::journal::Journal;
use super::ledger_store::LedgerStore;
use super::locks::AccountLocks;
use super::undo_redo::{CommandEngine, UndoRedoStatus};
use crate::types::audit::{actions, entities};
use crate::types::{
    Account, AccountStatus, AccountType, AuditEntry, Customer, CustomerProfile, LedgerError,
    Transaction, TransactionType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Configuration for the ledger service
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Maximum undo stack size per account, `None` for unbounded
    pub undo_depth: Option<usize>,
    /// Maximum time to wait for one account lock
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            undo_depth: None,
            lock_timeout: Duration::from_millis(5000),
        }
    }
}

impl LedgerConfig {
    /// Create a LedgerConfig with custom values
    ///
    /// An undo depth of zero means unbounded. A zero lock timeout is invalid
    /// and falls back to the default with a warning.
    pub fn new(undo_depth: usize, lock_timeout_ms: u64) -> Self {
        let default = Self::default();

        let lock_timeout = if lock_timeout_ms == 0 {
            warn!(
                "Invalid lock_timeout_ms ({}), using default ({})",
                lock_timeout_ms,
                default.lock_timeout.as_millis()
            );
            default.lock_timeout
        } else {
            Duration::from_millis(lock_timeout_ms)
        };

        Self {
            undo_depth: (undo_depth > 0).then_some(undo_depth),
            lock_timeout,
        }
    }
}

/// Result of an undo or redo on one account
#[derive(Debug, Clone, PartialEq)]
pub struct StackEffect {
    /// Record appended by the operation (REVERSAL for undo, COMPLETED for redo)
    pub record: Transaction,
    /// Record the operation acted on (now REVERSED for undo, the origin for redo)
    pub target: Transaction,
}

/// Result of an undo or redo request
#[derive(Debug, Clone, PartialEq)]
pub struct StackOutcome {
    pub primary: StackEffect,
    /// Effect on the counterparty when a transfer pair was processed together
    pub linked: Option<StackEffect>,
}

/// Consistent copy of the whole ledger
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub audit_logs: Vec<AuditEntry>,
    pub taken_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy)]
enum StackOp {
    Undo,
    Redo,
}

impl StackOp {
    fn name(&self) -> &'static str {
        match self {
            StackOp::Undo => "undo",
            StackOp::Redo => "redo",
        }
    }

    fn action(&self) -> &'static str {
        match self {
            StackOp::Undo => actions::UNDO_TRANSACTION,
            StackOp::Redo => actions::REDO_TRANSACTION,
        }
    }
}

/// Orchestrates ledger operations
#[derive(Debug)]
pub struct LedgerService {
    config: LedgerConfig,
    accounts: LedgerStore,
    customers: CustomerStore,
    journal: Journal,
    commands: CommandEngine,
    locks: AccountLocks,
    audit: AuditLogger,
    view: RwLock<()>,
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl LedgerService {
    /// Create a service with an in-memory audit trail
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_audit(config, AuditLogger::default())
    }

    pub fn with_audit(config: LedgerConfig, audit: AuditLogger) -> Self {
        Self {
            accounts: LedgerStore::new(),
            customers: CustomerStore::new(),
            journal: Journal::new(),
            commands: CommandEngine::new(config.undo_depth),
            locks: AccountLocks::new(config.lock_timeout),
            audit,
            view: RwLock::new(()),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    // ---------------------------------------------------------------------
    // Customers and accounts
    // ---------------------------------------------------------------------

    /// Register a customer
    pub async fn create_customer(
        &self,
        profile: CustomerProfile,
        actor: &str,
    ) -> Result<Customer, LedgerError> {
        let customer = Customer::register(profile);
        self.audit.success(
            actor,
            actions::CREATE_CUSTOMER,
            entities::CUSTOMER,
            &customer.customer_id,
            format!("Created customer {}", customer.full_name()),
        )?;
        {
            let _commit = self.commit();
            self.customers.insert(customer.clone());
        }
        info!(customer_id = %customer.customer_id, actor, "Customer created");
        Ok(customer)
    }

    pub fn customer(&self, customer_id: &str) -> Result<Customer, LedgerError> {
        let _view = self.view();
        self.customers.get(customer_id)
    }

    pub fn customers(&self) -> Vec<Customer> {
        let _view = self.view();
        self.customers.all()
    }

    /// Open an ACTIVE, zero-balance account for an existing customer
    pub async fn open_account(
        &self,
        customer_id: &str,
        account_type: AccountType,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        let result = self.open_account_inner(customer_id, account_type, actor).await;
        self.audit_failure(
            result,
            actor,
            actions::CREATE_ACCOUNT,
            entities::CUSTOMER,
            customer_id,
            format!("Failed to open {} account", account_type.as_str()),
        )
    }

    /// Open an account from a type name such as `"SAVINGS"`
    ///
    /// An unknown name is rejected with `InvalidInput` and audited like any
    /// other failed `open_account`.
    pub async fn open_account_named(
        &self,
        customer_id: &str,
        account_type: &str,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        match account_type.parse::<AccountType>() {
            Ok(account_type) => self.open_account(customer_id, account_type, actor).await,
            Err(message) => self.audit_failure(
                Err(LedgerError::invalid_input("accountType", message)),
                actor,
                actions::CREATE_ACCOUNT,
                entities::CUSTOMER,
                customer_id,
                format!("Failed to open {} account", account_type),
            ),
        }
    }

    async fn open_account_inner(
        &self,
        customer_id: &str,
        account_type: AccountType,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        let customer = self.customers.get(customer_id)?;
        let account = Account::open(customer.customer_id, account_type);
        self.audit.success(
            actor,
            actions::CREATE_ACCOUNT,
            entities::ACCOUNT,
            &account.account_number,
            format!(
                "Opened {} {} for customer {}",
                account_type.display_name(),
                account.account_number,
                customer_id
            ),
        )?;
        {
            let _commit = self.commit();
            self.accounts.put(account.clone());
        }
        info!(account = %account.account_number, customer_id, actor, "Account opened");
        Ok(account)
    }

    pub fn account(&self, account_number: &str) -> Result<Account, LedgerError> {
        let _view = self.view();
        self.accounts.get(account_number)
    }

    pub fn accounts(&self) -> Vec<Account> {
        let _view = self.view();
        self.accounts.all()
    }

    /// Accounts owned by a customer
    pub fn accounts_for_customer(&self, customer_id: &str) -> Result<Vec<Account>, LedgerError> {
        let _view = self.view();
        let customer = self.customers.get(customer_id)?;
        Ok(self.accounts.for_customer(&customer.customer_id))
    }

    /// Change an account's status
    ///
    /// Closing an account discards its undo/redo stacks.
    pub async fn update_account_status(
        &self,
        account_number: &str,
        status: AccountStatus,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        let result = self.update_status_inner(account_number, status, actor).await;
        self.audit_failure(
            result,
            actor,
            actions::UPDATE_ACCOUNT_STATUS,
            entities::ACCOUNT,
            account_number,
            format!("Failed to set status {}", status),
        )
    }

    /// Change an account's status from a name such as `"FROZEN"`
    pub async fn update_account_status_named(
        &self,
        account_number: &str,
        status: &str,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        match status.parse::<AccountStatus>() {
            Ok(status) => self.update_account_status(account_number, status, actor).await,
            Err(message) => self.audit_failure(
                Err(LedgerError::invalid_input("status", message)),
                actor,
                actions::UPDATE_ACCOUNT_STATUS,
                entities::ACCOUNT,
                account_number,
                format!("Failed to set status {}", status),
            ),
        }
    }

    async fn update_status_inner(
        &self,
        account_number: &str,
        status: AccountStatus,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        self.accounts.get(account_number)?;
        let _guard = self.locks.acquire(&[account_number]).await?;
        let previous = self.accounts.get(account_number)?.status;

        self.audit.success(
            actor,
            actions::UPDATE_ACCOUNT_STATUS,
            entities::ACCOUNT,
            account_number,
            format!("Status changed from {} to {}", previous, status),
        )?;

        let _commit = self.commit();
        let account = self.accounts.update(account_number, |account| {
            account.status = status;
            account.updated_at = Utc::now();
            Ok(())
        })?;
        if status == AccountStatus::Closed {
            self.commands.discard(account_number);
        }
        info!(account = account_number, %previous, %status, actor, "Account status updated");
        Ok(account)
    }

    // ---------------------------------------------------------------------
    // Monetary operations
    // ---------------------------------------------------------------------

    /// Credit an ACTIVE account
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - amount is not positive
    /// * `AccountNotFound` / `AccountNotActive`
    /// * `LockTimeout` - the account lock was not acquired in time
    /// * `AuditUnavailable` - nothing was applied
    pub async fn deposit(
        &self,
        account_number: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Result<Transaction, LedgerError> {
        let result = self
            .apply_single(TransactionType::Deposit, account_number, amount, description, actor)
            .await;
        self.audit_failure(
            result,
            actor,
            actions::DEPOSIT,
            entities::ACCOUNT,
            account_number,
            format!("Deposit of {} failed", amount),
        )
    }

    /// Debit an ACTIVE account
    ///
    /// Fails with `InsufficientFunds` when the amount exceeds the balance;
    /// the check and the debit happen under the account lock.
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Result<Transaction, LedgerError> {
        let result = self
            .apply_single(TransactionType::Withdraw, account_number, amount, description, actor)
            .await;
        self.audit_failure(
            result,
            actor,
            actions::WITHDRAWAL,
            entities::ACCOUNT,
            account_number,
            format!("Withdrawal of {} failed", amount),
        )
    }

    async fn apply_single(
        &self,
        tx_type: TransactionType,
        account_number: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Result<Transaction, LedgerError> {
        ensure_positive(amount)?;
        self.accounts.get(account_number)?;
        let _guard = self.locks.acquire(&[account_number]).await?;

        let mut account = self.accounts.get(account_number)?;
        account.ensure_active()?;
        let (action, label) = match tx_type {
            TransactionType::Deposit => (actions::DEPOSIT, "Deposit"),
            _ => (actions::WITHDRAWAL, "Withdrawal"),
        };
        account.apply_delta(tx_type.signed_effect(amount), label)?;

        let tx = self.journal.draft(
            tx_type,
            account_number,
            amount,
            description_or(description, label),
            actor,
        );
        self.audit.success(
            actor,
            action,
            entities::ACCOUNT,
            account_number,
            format!("{} of {} ({})", label, amount, tx.reference),
        )?;

        {
            let _commit = self.commit();
            let balance = account.balance;
            self.accounts.put(account);
            self.journal.append(tx.clone());
            if let Some(command) = Command::for_transaction(&tx) {
                self.commands.record(command);
            }
            info!(
                account = account_number,
                transaction_id = tx.transaction_id,
                %amount,
                %balance,
                actor,
                "{} applied",
                label
            );
        }
        Ok(tx)
    }

    /// Move funds between two ACTIVE accounts
    ///
    /// Both sides are applied in one commit under both account locks. The two
    /// records share a fresh correlation id, and one command is recorded on
    /// each account's undo stack.
    ///
    /// # Returns
    ///
    /// The `(TRANSFER_OUT, TRANSFER_IN)` records
    pub async fn transfer(
        &self,
        source: &str,
        destination: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        let result = self
            .transfer_inner(source, destination, amount, description, actor)
            .await;
        self.audit_failure(
            result,
            actor,
            actions::TRANSFER,
            entities::ACCOUNT,
            source,
            format!("Transfer of {} from {} to {} failed", amount, source, destination),
        )
    }

    async fn transfer_inner(
        &self,
        source: &str,
        destination: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        ensure_positive(amount)?;
        if source == destination {
            return Err(LedgerError::same_account(source));
        }
        self.accounts.get(source)?;
        self.accounts.get(destination)?;
        let _guard = self.locks.acquire(&[source, destination]).await?;

        let mut from = self.accounts.get(source)?;
        let mut to = self.accounts.get(destination)?;
        from.ensure_active()?;
        to.ensure_active()?;
        from.debit(amount, "transfer")?;
        to.credit(amount, "transfer")?;

        let description = description_or(description, "Transfer");
        let correlation_id = Uuid::new_v4();
        let mut out = self
            .journal
            .draft(TransactionType::TransferOut, source, amount, description, actor);
        out.counterparty = Some(destination.to_string());
        out.correlation_id = Some(correlation_id);
        let mut inn = self
            .journal
            .draft(TransactionType::TransferIn, destination, amount, description, actor);
        inn.counterparty = Some(source.to_string());
        inn.correlation_id = Some(correlation_id);

        self.audit.success(
            actor,
            actions::TRANSFER,
            entities::ACCOUNT,
            source,
            format!(
                "Transferred {} from {} to {} ({}, {})",
                amount, source, destination, out.reference, inn.reference
            ),
        )?;

        {
            let _commit = self.commit();
            self.accounts.put(from);
            self.accounts.put(to);
            self.journal.append(out.clone());
            self.journal.append(inn.clone());
            for tx in [&out, &inn] {
                if let Some(command) = Command::for_transaction(tx) {
                    self.commands.record(command);
                }
            }
        }
        info!(
            source,
            destination,
            %amount,
            %correlation_id,
            actor,
            "Transfer applied"
        );
        Ok((out, inn))
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    /// Journal records of an account, newest first
    pub fn history(&self, account_number: &str) -> Result<Vec<Transaction>, LedgerError> {
        let _view = self.view();
        self.accounts.get(account_number)?;
        Ok(self.journal.history(account_number))
    }

    /// Journal records of one type, newest first
    pub fn history_of_type(
        &self,
        account_number: &str,
        tx_type: TransactionType,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let _view = self.view();
        self.accounts.get(account_number)?;
        Ok(self.journal.history_of_type(account_number, tx_type))
    }

    /// Sum of the balance contributions of an account's journal records
    ///
    /// Always equal to the account balance.
    pub fn journal_balance(&self, account_number: &str) -> Decimal {
        let _view = self.view();
        self.journal.balance_of(account_number)
    }

    // ---------------------------------------------------------------------
    // Undo / redo
    // ---------------------------------------------------------------------

    pub fn undo_redo_status(&self, account_number: &str) -> Result<UndoRedoStatus, LedgerError> {
        let _view = self.view();
        self.accounts.get(account_number)?;
        Ok(self.commands.status(account_number))
    }

    /// Reverse the most recent command on an account
    ///
    /// A transfer half is only reversed together with its counterpart, and
    /// only when `include_linked` is set and the counterpart is on top of the
    /// other account's undo stack.
    pub async fn undo(
        &self,
        account_number: &str,
        actor: &str,
        include_linked: bool,
    ) -> Result<StackOutcome, LedgerError> {
        let result = self
            .stack_operation(StackOp::Undo, account_number, actor, include_linked)
            .await;
        self.audit_failure(
            result,
            actor,
            actions::UNDO_TRANSACTION,
            entities::ACCOUNT,
            account_number,
            "Undo failed",
        )
    }

    /// Re-apply the most recently undone command on an account
    pub async fn redo(
        &self,
        account_number: &str,
        actor: &str,
        include_linked: bool,
    ) -> Result<StackOutcome, LedgerError> {
        let result = self
            .stack_operation(StackOp::Redo, account_number, actor, include_linked)
            .await;
        self.audit_failure(
            result,
            actor,
            actions::REDO_TRANSACTION,
            entities::ACCOUNT,
            account_number,
            "Redo failed",
        )
    }

    fn peek(&self, op: StackOp, account_number: &str) -> Option<Command> {
        match op {
            StackOp::Undo => self.commands.peek_undo(account_number),
            StackOp::Redo => self.commands.peek_redo(account_number),
        }
    }

    /// Accounts whose locks are needed to process `top`
    fn lock_set(account_number: &str, top: Option<&Command>, include_linked: bool) -> Vec<String> {
        let mut accounts = vec![account_number.to_string()];
        if include_linked {
            if let Some(counterparty) = top
                .filter(|command| command.is_transfer_half())
                .and_then(|command| command.counterparty.clone())
            {
                accounts.push(counterparty);
            }
        }
        accounts.sort();
        accounts
    }

    async fn stack_operation(
        &self,
        op: StackOp,
        account_number: &str,
        actor: &str,
        include_linked: bool,
    ) -> Result<StackOutcome, LedgerError> {
        self.accounts.get(account_number)?;

        // The top of the stack decides which locks are needed, and it can only
        // be trusted once those locks are held. Re-check after locking and
        // retry if another request changed it in between.
        let mut wanted = Self::lock_set(
            account_number,
            self.peek(op, account_number).as_ref(),
            include_linked,
        );
        loop {
            let names: Vec<&str> = wanted.iter().map(String::as_str).collect();
            let guard = self.locks.acquire(&names).await?;
            let needed = Self::lock_set(
                account_number,
                self.peek(op, account_number).as_ref(),
                include_linked,
            );
            if needed.iter().all(|account| wanted.contains(account)) {
                let outcome = self.stack_operation_locked(op, account_number, actor, include_linked).await;
                drop(guard);
                return outcome;
            }
            drop(guard);
            wanted = needed;
        }
    }

    async fn stack_operation_locked(
        &self,
        op: StackOp,
        account_number: &str,
        actor: &str,
        include_linked: bool,
    ) -> Result<StackOutcome, LedgerError> {
        let command = self.peek(op, account_number).ok_or_else(|| match op {
            StackOp::Undo => LedgerError::nothing_to_undo(account_number),
            StackOp::Redo => LedgerError::nothing_to_redo(account_number),
        })?;
        let mut account = self.accounts.get(account_number)?;
        account.ensure_active()?;

        let linked = if command.is_transfer_half() {
            let counterparty = command.counterparty.clone().unwrap_or_default();
            if !include_linked {
                return Err(LedgerError::partial_reversal(
                    account_number,
                    &counterparty,
                    op.name(),
                    "linked transfer requires includeLinked",
                ));
            }
            let linked = self
                .peek(op, &counterparty)
                .filter(|other| other.is_linked_to(&command))
                .ok_or_else(|| {
                    LedgerError::partial_reversal(
                        account_number,
                        &counterparty,
                        op.name(),
                        "linked command is not on top of the counterparty's stack",
                    )
                })?;
            let mut other = self.accounts.get(&counterparty)?;
            other.ensure_active()?;
            Some((linked, other))
        } else {
            None
        };

        let primary = self.stage_effect(op, &command, &mut account, actor)?;
        let linked = match linked {
            Some((linked_command, mut other)) => {
                let effect = self.stage_effect(op, &linked_command, &mut other, actor)?;
                Some((linked_command, other, effect))
            }
            None => None,
        };

        let description = match &linked {
            Some((_, other, _)) => format!(
                "{} of {} {} on {} and {}",
                capitalize(op.name()),
                command.label(),
                primary.target.reference,
                account_number,
                other.account_number
            ),
            None => format!(
                "{} of {} {} on {}",
                capitalize(op.name()),
                command.label(),
                primary.target.reference,
                account_number
            ),
        };
        self.audit.success(
            actor,
            op.action(),
            entities::ACCOUNT,
            account_number,
            description,
        )?;

        let _commit = self.commit();
        let primary = self.commit_effect(op, account, primary);
        let linked = linked.map(|(_, other, effect)| self.commit_effect(op, other, effect));
        info!(
            account = account_number,
            operation = op.name(),
            origin = command.origin,
            linked = linked.is_some(),
            actor,
            "Stack operation applied"
        );
        Ok(StackOutcome { primary, linked })
    }

    /// Stage one undo or redo effect on a cloned account
    ///
    /// Returns the record to append and the record acted on. Nothing is
    /// written until [`LedgerService::commit_effect`].
    fn stage_effect(
        &self,
        op: StackOp,
        command: &Command,
        account: &mut Account,
        actor: &str,
    ) -> Result<StackEffect, LedgerError> {
        match op {
            StackOp::Undo => {
                let target = self
                    .journal
                    .effective_record(&command.account_number, command.origin)
                    .ok_or_else(|| {
                        warn!(
                            account = %command.account_number,
                            origin = command.origin,
                            "No effective journal record for undo command"
                        );
                        LedgerError::nothing_to_undo(&command.account_number)
                    })?;
                account.apply_delta(command.inverse_delta(), "undo")?;
                let mut record = self.journal.draft(
                    TransactionType::Reversal,
                    &command.account_number,
                    command.amount,
                    &format!("Undo of {}", target.reference),
                    actor,
                );
                record.origin = command.origin;
                record.reverses = Some(target.transaction_id);
                record.correlation_id = command.correlation_id;
                record.counterparty = command.counterparty.clone();
                Ok(StackEffect { record, target })
            }
            StackOp::Redo => {
                account.apply_delta(command.apply_delta(), "redo")?;
                let mut record = self.journal.draft(
                    command.kind.transaction_type(),
                    &command.account_number,
                    command.amount,
                    "",
                    actor,
                );
                let target = self
                    .journal
                    .get(command.origin)
                    .unwrap_or_else(|| record.clone());
                record.description = format!("Redo of {}", target.reference);
                record.origin = command.origin;
                record.correlation_id = command.correlation_id;
                record.counterparty = command.counterparty.clone();
                Ok(StackEffect { record, target })
            }
        }
    }

    /// Write a staged effect; the caller holds the exclusive view lock
    fn commit_effect(&self, op: StackOp, account: Account, effect: StackEffect) -> StackEffect {
        let account_number = account.account_number.clone();
        self.accounts.put(account);
        match op {
            StackOp::Undo => {
                let target = self
                    .journal
                    .mark_reversed(effect.target.transaction_id)
                    .unwrap_or(effect.target);
                self.journal.append(effect.record.clone());
                self.commands.commit_undo(&account_number);
                StackEffect {
                    record: effect.record,
                    target,
                }
            }
            StackOp::Redo => {
                self.journal.append(effect.record.clone());
                self.commands.commit_redo(&account_number);
                effect
            }
        }
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    /// Consistent copy of customers, accounts, journal and audit trail
    ///
    /// Commits wait while the copy is taken.
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let _view = self.view();
        LedgerSnapshot {
            customers: self.customers.all(),
            accounts: self.accounts.all(),
            transactions: self.journal.all(),
            audit_logs: self.audit.entries(),
            taken_at: Some(Utc::now()),
        }
    }

    /// Shared side of the view lock, held by readers
    fn view(&self) -> RwLockReadGuard<'_, ()> {
        self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive side of the view lock, held while a commit writes
    ///
    /// Callers must not await while holding it.
    fn commit(&self) -> RwLockWriteGuard<'_, ()> {
        self.view.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a FAILURE audit entry when `result` is an error
    ///
    /// When the sink refuses that entry the caller gets `AuditUnavailable`
    /// instead of the business error, whose text is carried in the message.
    fn audit_failure<T>(
        &self,
        result: Result<T, LedgerError>,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        description: impl Into<String>,
    ) -> Result<T, LedgerError> {
        if let Err(error) = &result {
            warn!(%action, entity_id, actor, %error, "Operation rejected");
            self.audit
                .failure(actor, action, entity_type, entity_id, description, error)?;
        }
        result
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount));
    }
    Ok(())
}

fn description_or<'a>(description: &'a str, fallback: &'a str) -> &'a str {
    if description.trim().is_empty() {
        fallback
    } else {
        description
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::InMemoryAuditSink;
    use crate::types::{AuditFilter, AuditResult, TransactionStatus};
    use rstest::rstest;
    use std::sync::Arc;

    const ACTOR: &str = "teller-1";

    async fn service_with_account(balance: i64) -> (LedgerService, String) {
        let service = LedgerService::default();
        let account = open(&service).await;
        if balance > 0 {
            service
                .deposit(&account, Decimal::new(balance, 0), "opening", ACTOR)
                .await
                .unwrap();
        }
        (service, account)
    }

    async fn open(service: &LedgerService) -> String {
        let customer = service
            .create_customer(CustomerProfile::default(), ACTOR)
            .await
            .unwrap();
        service
            .open_account(&customer.customer_id, AccountType::Savings, ACTOR)
            .await
            .unwrap()
            .account_number
    }

    fn balance(service: &LedgerService, account: &str) -> Decimal {
        service.account(account).unwrap().balance
    }

    #[test]
    fn test_config_zero_values() {
        let config = LedgerConfig::new(0, 0);

        assert_eq!(config.undo_depth, None);
        assert_eq!(config.lock_timeout, Duration::from_millis(5000));
        assert_eq!(LedgerConfig::new(10, 250).undo_depth, Some(10));
    }

    #[tokio::test]
    async fn test_deposit_increments_balance_and_records_command() {
        let (service, account) = service_with_account(0).await;

        let tx = service
            .deposit(&account, Decimal::new(500, 0), "", ACTOR)
            .await
            .unwrap();

        assert_eq!(tx.tx_type, TransactionType::Deposit);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.description, "Deposit");
        assert_eq!(balance(&service, &account), Decimal::new(500, 0));
        assert!(service.undo_redo_status(&account).unwrap().can_undo);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-1, 0))]
    #[tokio::test]
    async fn test_non_positive_amounts_rejected(#[case] amount: Decimal) {
        let (service, account) = service_with_account(100).await;

        let result = service.deposit(&account, amount, "", ACTOR).await;

        assert_eq!(result, Err(LedgerError::invalid_amount(amount)));
        assert_eq!(balance(&service, &account), Decimal::new(100, 0));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_audits_failure() {
        let (service, account) = service_with_account(100).await;

        let result = service
            .withdraw(&account, Decimal::new(101, 0), "", ACTOR)
            .await;

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(balance(&service, &account), Decimal::new(100, 0));
        let failures = service.audit().query(&AuditFilter {
            result: Some(AuditResult::Failure),
            ..Default::default()
        });
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].action, actions::WITHDRAWAL);
    }

    #[tokio::test]
    async fn test_inactive_account_rejects_operations() {
        let (service, account) = service_with_account(100).await;
        service
            .update_account_status(&account, AccountStatus::Frozen, ACTOR)
            .await
            .unwrap();

        let deposit = service.deposit(&account, Decimal::ONE, "", ACTOR).await;
        let undo = service.undo(&account, ACTOR, false).await;

        assert_eq!(
            deposit,
            Err(LedgerError::account_not_active(&account, AccountStatus::Frozen))
        );
        assert_eq!(
            undo,
            Err(LedgerError::account_not_active(&account, AccountStatus::Frozen))
        );
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let service = LedgerService::default();

        let result = service.deposit("ACC000000000000", Decimal::ONE, "", ACTOR).await;

        assert_eq!(result, Err(LedgerError::account_not_found("ACC000000000000")));
    }

    #[tokio::test]
    async fn test_open_account_requires_customer() {
        let service = LedgerService::default();

        let result = service
            .open_account("missing", AccountType::Current, ACTOR)
            .await;

        assert_eq!(result, Err(LedgerError::customer_not_found("missing")));
    }

    #[tokio::test]
    async fn test_undo_and_redo_single_deposit() {
        let (service, account) = service_with_account(1000).await;
        let deposit = service
            .deposit(&account, Decimal::new(500, 0), "salary", ACTOR)
            .await
            .unwrap();

        let undone = service.undo(&account, ACTOR, false).await.unwrap();

        assert_eq!(balance(&service, &account), Decimal::new(1000, 0));
        assert_eq!(undone.primary.record.tx_type, TransactionType::Reversal);
        assert_eq!(undone.primary.record.reverses, Some(deposit.transaction_id));
        assert_eq!(undone.primary.target.status, TransactionStatus::Reversed);
        assert!(undone.linked.is_none());

        let redone = service.redo(&account, ACTOR, false).await.unwrap();

        assert_eq!(balance(&service, &account), Decimal::new(1500, 0));
        assert_eq!(redone.primary.record.tx_type, TransactionType::Deposit);
        assert_eq!(redone.primary.record.origin, deposit.transaction_id);
        assert_eq!(service.journal_balance(&account), Decimal::new(1500, 0));
    }

    #[tokio::test]
    async fn test_undo_withdrawal_after_redo_reverses_redo_record() {
        let (service, account) = service_with_account(1000).await;
        service
            .withdraw(&account, Decimal::new(300, 0), "", ACTOR)
            .await
            .unwrap();
        service.undo(&account, ACTOR, false).await.unwrap();
        let redone = service.redo(&account, ACTOR, false).await.unwrap();

        let undone = service.undo(&account, ACTOR, false).await.unwrap();

        assert_eq!(
            undone.primary.target.transaction_id,
            redone.primary.record.transaction_id
        );
        assert_eq!(balance(&service, &account), Decimal::new(1000, 0));
        assert_eq!(service.journal_balance(&account), Decimal::new(1000, 0));
    }

    #[tokio::test]
    async fn test_fresh_operation_clears_redo() {
        let (service, account) = service_with_account(1000).await;
        service
            .withdraw(&account, Decimal::new(100, 0), "", ACTOR)
            .await
            .unwrap();
        service.undo(&account, ACTOR, false).await.unwrap();
        assert!(service.undo_redo_status(&account).unwrap().can_redo);

        service
            .deposit(&account, Decimal::new(40, 0), "", ACTOR)
            .await
            .unwrap();

        assert_eq!(
            service.redo(&account, ACTOR, false).await,
            Err(LedgerError::nothing_to_redo(&account))
        );
        assert_eq!(balance(&service, &account), Decimal::new(1040, 0));
    }

    #[tokio::test]
    async fn test_undo_depth_bounds_history() {
        let service = LedgerService::new(LedgerConfig::new(2, 5000));
        let account = open(&service).await;
        for amount in [10, 20, 30] {
            service
                .deposit(&account, Decimal::new(amount, 0), "", ACTOR)
                .await
                .unwrap();
        }

        service.undo(&account, ACTOR, false).await.unwrap();
        service.undo(&account, ACTOR, false).await.unwrap();

        assert_eq!(
            service.undo(&account, ACTOR, false).await,
            Err(LedgerError::nothing_to_undo(&account))
        );
        assert_eq!(balance(&service, &account), Decimal::new(10, 0));
        assert_eq!(service.journal_balance(&account), Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_nothing_to_undo_or_redo() {
        let (service, account) = service_with_account(0).await;

        assert_eq!(
            service.undo(&account, ACTOR, false).await,
            Err(LedgerError::nothing_to_undo(&account))
        );
        assert_eq!(
            service.redo(&account, ACTOR, false).await,
            Err(LedgerError::nothing_to_redo(&account))
        );
    }

    #[tokio::test]
    async fn test_transfer_same_account_rejected() {
        let (service, account) = service_with_account(100).await;

        let result = service
            .transfer(&account, &account, Decimal::ONE, "", ACTOR)
            .await;

        assert_eq!(result, Err(LedgerError::same_account(&account)));
    }

    #[tokio::test]
    async fn test_transfer_pair_requires_linked_undo() {
        let (service, a) = service_with_account(1500).await;
        let b = open(&service).await;
        let (out, inn) = service
            .transfer(&a, &b, Decimal::new(300, 0), "rent", ACTOR)
            .await
            .unwrap();
        assert_eq!(out.correlation_id, inn.correlation_id);

        let partial = service.undo(&a, ACTOR, false).await;
        assert!(matches!(
            partial,
            Err(LedgerError::PartialReversalNotAllowed { .. })
        ));
        assert_eq!(balance(&service, &a), Decimal::new(1200, 0));
        assert_eq!(balance(&service, &b), Decimal::new(300, 0));

        let outcome = service.undo(&a, ACTOR, true).await.unwrap();

        assert!(outcome.linked.is_some());
        assert_eq!(balance(&service, &a), Decimal::new(1500, 0));
        assert_eq!(balance(&service, &b), Decimal::ZERO);
        assert!(service.undo_redo_status(&b).unwrap().can_redo);

        service.redo(&b, ACTOR, true).await.unwrap();
        assert_eq!(balance(&service, &a), Decimal::new(1200, 0));
        assert_eq!(balance(&service, &b), Decimal::new(300, 0));
    }

    #[tokio::test]
    async fn test_linked_undo_requires_counterpart_on_top() {
        let (service, a) = service_with_account(1000).await;
        let b = open(&service).await;
        service
            .transfer(&a, &b, Decimal::new(300, 0), "", ACTOR)
            .await
            .unwrap();
        service
            .deposit(&b, Decimal::new(50, 0), "", ACTOR)
            .await
            .unwrap();

        let result = service.undo(&a, ACTOR, true).await;

        assert!(matches!(
            result,
            Err(LedgerError::PartialReversalNotAllowed { .. })
        ));
        assert_eq!(balance(&service, &b), Decimal::new(350, 0));
    }

    #[tokio::test]
    async fn test_closing_account_discards_stacks() {
        let (service, account) = service_with_account(100).await;

        service
            .update_account_status(&account, AccountStatus::Closed, ACTOR)
            .await
            .unwrap();

        let status = service.undo_redo_status(&account).unwrap();
        assert!(!status.can_undo);
        assert!(!status.can_redo);
    }

    #[tokio::test]
    async fn test_audit_unavailable_leaves_ledger_untouched() {
        let audit = AuditLogger::new(Arc::new(InMemoryAuditSink::bounded(3)));
        let service = LedgerService::with_audit(LedgerConfig::default(), audit);
        let customer = service
            .create_customer(CustomerProfile::default(), ACTOR)
            .await
            .unwrap();
        let account = service
            .open_account(&customer.customer_id, AccountType::Savings, ACTOR)
            .await
            .unwrap()
            .account_number;
        service
            .deposit(&account, Decimal::new(10, 0), "", ACTOR)
            .await
            .unwrap();

        let result = service.deposit(&account, Decimal::new(5, 0), "", ACTOR).await;

        assert!(matches!(result, Err(LedgerError::AuditUnavailable { .. })));
        assert_eq!(balance(&service, &account), Decimal::new(10, 0));
        assert_eq!(service.history(&account).unwrap().len(), 1);
        assert_eq!(service.undo_redo_status(&account).unwrap().undo_stack_size, 1);
    }

    #[tokio::test]
    async fn test_refused_failure_entry_surfaces_as_audit_unavailable() {
        let audit = AuditLogger::new(Arc::new(InMemoryAuditSink::bounded(3)));
        let service = LedgerService::with_audit(LedgerConfig::default(), audit);
        let account = open(&service).await;
        service
            .deposit(&account, Decimal::new(10, 0), "", ACTOR)
            .await
            .unwrap();

        let result = service
            .withdraw(&account, Decimal::new(50, 0), "", ACTOR)
            .await;

        match result {
            Err(LedgerError::AuditUnavailable { message }) => {
                assert!(message.contains(actions::WITHDRAWAL));
                assert!(message.contains("Insufficient funds"));
            }
            other => panic!("expected AuditUnavailable, got {:?}", other),
        }
        assert_eq!(balance(&service, &account), Decimal::new(10, 0));
        assert_eq!(service.audit().entries().len(), 3);
    }

    fn failures(service: &LedgerService) -> Vec<AuditEntry> {
        service.audit().query(&AuditFilter {
            result: Some(AuditResult::Failure),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_unknown_account_type_is_audited() {
        let service = LedgerService::default();
        let customer = service
            .create_customer(CustomerProfile::default(), ACTOR)
            .await
            .unwrap();

        let err = service
            .open_account_named(&customer.customer_id, "GOLD", ACTOR)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidInput { ref field, .. } if field == "accountType"));
        let failures = failures(&service);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].action, actions::CREATE_ACCOUNT);
        assert_eq!(failures[0].error_message, Some(err.to_string()));
    }

    #[tokio::test]
    async fn test_unknown_status_is_audited() {
        let (service, account) = service_with_account(0).await;

        let err = service
            .update_account_status_named(&account, "DORMANT", ACTOR)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidInput { ref field, .. } if field == "status"));
        let failures = failures(&service);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity_id, account);
        assert_eq!(service.account(&account).unwrap().status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_undo_entries_share_the_account_entity() {
        let (service, account) = service_with_account(100).await;

        service.undo(&account, ACTOR, false).await.unwrap();
        service.redo(&account, ACTOR, false).await.unwrap();
        service.redo(&account, ACTOR, false).await.unwrap_err();

        let entries = service.audit().query(&AuditFilter {
            entity_type: Some(entities::ACCOUNT.to_string()),
            entity_id: Some(account.clone()),
            ..Default::default()
        });
        let stack_entries: Vec<_> = entries
            .iter()
            .filter(|entry| {
                entry.action == actions::UNDO_TRANSACTION || entry.action == actions::REDO_TRANSACTION
            })
            .collect();
        assert_eq!(stack_entries.len(), 3);
        assert_eq!(stack_entries[0].result, AuditResult::Failure);
    }

    #[tokio::test]
    async fn test_every_undo_attempt_is_audited_once() {
        let (service, account) = service_with_account(100).await;
        let before = service.audit().entries().len();

        service.undo(&account, ACTOR, false).await.unwrap();
        let _ = service.undo(&account, ACTOR, false).await;

        let undo_entries = service.audit().query(&AuditFilter {
            action: Some(actions::UNDO_TRANSACTION.to_string()),
            ..Default::default()
        });
        assert_eq!(undo_entries.len(), 2);
        assert_eq!(service.audit().entries().len(), before + 2);
        assert_eq!(undo_entries[0].result, AuditResult::Failure);
        assert_eq!(undo_entries[1].result, AuditResult::Success);
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let (service, account) = service_with_account(1000).await;
        let service = Arc::new(service);

        let mut handles = vec![];
        for _ in 0..20 {
            let service = Arc::clone(&service);
            let account = account.clone();
            handles.push(tokio::spawn(async move {
                service
                    .withdraw(&account, Decimal::new(100, 0), "", ACTOR)
                    .await
                    .is_ok()
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(balance(&service, &account), Decimal::ZERO);
        assert_eq!(service.journal_balance(&account), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_snapshot_contains_all_collections() {
        let (service, account) = service_with_account(100).await;

        let snapshot = service.snapshot().await;

        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.accounts[0].account_number, account);
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.audit_logs.len(), 3);
        assert!(snapshot.taken_at.is_some());
    }
}
