//! Account-related types for the banking ledger
//!
//! This module defines the Account structure, its enumerations, and the
//! balance operations the ledger applies to it.

use super::customer::CustomerId;
use super::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account identifier
///
/// Account numbers are the identifiers used by every ledger operation,
/// including undo/redo, so there is no separate internal account id.
pub type AccountNumber = String;

/// Currency every account is denominated in
pub const DEFAULT_CURRENCY: &str = "INR";

/// Kinds of account a customer can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Current,
    FixedDeposit,
    RecurringDeposit,
}

impl AccountType {
    /// Human readable name used in audit descriptions
    pub fn display_name(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings Account",
            AccountType::Current => "Current Account",
            AccountType::FixedDeposit => "Fixed Deposit",
            AccountType::RecurringDeposit => "Recurring Deposit",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "SAVINGS",
            AccountType::Current => "CURRENT",
            AccountType::FixedDeposit => "FIXED_DEPOSIT",
            AccountType::RecurringDeposit => "RECURRING_DEPOSIT",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SAVINGS" => Ok(AccountType::Savings),
            "CURRENT" => Ok(AccountType::Current),
            "FIXED_DEPOSIT" => Ok(AccountType::FixedDeposit),
            "RECURRING_DEPOSIT" => Ok(AccountType::RecurringDeposit),
            other => Err(format!("Unknown account type '{}'", other)),
        }
    }
}

/// Lifecycle status of an account
///
/// Only ACTIVE accounts accept monetary operations, undo, or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
    Frozen,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Frozen => "FROZEN",
            AccountStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            "FROZEN" => Ok(AccountStatus::Frozen),
            "CLOSED" => Ok(AccountStatus::Closed),
            other => Err(format!("Unknown account status '{}'", other)),
        }
    }
}

/// Bank account state
///
/// The Ledger Store owns these records exclusively. An account never embeds
/// its transactions; the journal is queried by account number instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account number (`ACC` followed by 12 hex characters)
    pub account_number: AccountNumber,

    /// Owning customer, held as a weak reference by identifier
    pub customer_id: CustomerId,

    pub account_type: AccountType,

    /// Current balance
    ///
    /// Never negative. Every change goes through [`Account::credit`] or
    /// [`Account::debit`], which use checked arithmetic.
    pub balance: Decimal,

    pub currency: String,

    pub status: AccountStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Timestamp of the last balance change, if any
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new ACTIVE account with a zero balance and a fresh number
    pub fn open(customer_id: CustomerId, account_type: AccountType) -> Self {
        Self::with_number(generate_account_number(), customer_id, account_type)
    }

    /// Create a new ACTIVE account with a zero balance and the given number
    pub fn with_number(
        account_number: AccountNumber,
        customer_id: CustomerId,
        account_type: AccountType,
    ) -> Self {
        let now = Utc::now();
        Account {
            account_number,
            customer_id,
            account_type,
            balance: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
            last_transaction_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Fail with `AccountNotActive` unless the account accepts operations
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LedgerError::account_not_active(
                &self.account_number,
                self.status,
            ))
        }
    }

    /// Add funds to the balance
    pub fn credit(&mut self, amount: Decimal, operation: &str) -> Result<(), LedgerError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow(operation, &self.account_number))?;
        self.touch();
        Ok(())
    }

    /// Remove funds from the balance
    ///
    /// Fails with `InsufficientFunds` and leaves the balance untouched when
    /// the amount exceeds the current balance.
    pub fn debit(&mut self, amount: Decimal, operation: &str) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::insufficient_funds(
                &self.account_number,
                self.balance,
                amount,
            ));
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow(operation, &self.account_number))?;
        self.touch();
        Ok(())
    }

    /// Apply a signed delta, crediting positive and debiting negative values
    pub fn apply_delta(&mut self, delta: Decimal, operation: &str) -> Result<(), LedgerError> {
        if delta.is_sign_negative() {
            self.debit(-delta, operation)
        } else {
            self.credit(delta, operation)
        }
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = now;
        self.last_transaction_at = Some(now);
    }
}

fn generate_account_number() -> AccountNumber {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ACC{}", hex[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn account() -> Account {
        Account::with_number("ACC1".to_string(), "cust-1".to_string(), AccountType::Savings)
    }

    #[test]
    fn test_open_starts_active_with_zero_balance() {
        let account = Account::open("cust-1".to_string(), AccountType::Current);

        assert!(account.account_number.starts_with("ACC"));
        assert_eq!(account.account_number.len(), 15);
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.currency, "INR");
        assert!(account.last_transaction_at.is_none());
    }

    #[test]
    fn test_debit_more_than_balance_leaves_balance_unchanged() {
        let mut account = account();
        account.credit(Decimal::new(100, 0), "deposit").unwrap();

        let result = account.debit(Decimal::new(101, 0), "withdrawal");

        assert_eq!(
            result,
            Err(LedgerError::insufficient_funds(
                "ACC1",
                Decimal::new(100, 0),
                Decimal::new(101, 0)
            ))
        );
        assert_eq!(account.balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_debit_entire_balance_reaches_zero() {
        let mut account = account();
        account.credit(Decimal::new(2500, 2), "deposit").unwrap();

        account.debit(Decimal::new(2500, 2), "withdrawal").unwrap();

        assert_eq!(account.balance, Decimal::ZERO);
        assert!(account.last_transaction_at.is_some());
    }

    #[rstest]
    #[case::positive(Decimal::new(50, 0), Decimal::new(150, 0))]
    #[case::negative(Decimal::new(-30, 0), Decimal::new(70, 0))]
    fn test_apply_delta(#[case] delta: Decimal, #[case] expected: Decimal) {
        let mut account = account();
        account.credit(Decimal::new(100, 0), "deposit").unwrap();

        account.apply_delta(delta, "undo").unwrap();

        assert_eq!(account.balance, expected);
    }

    #[test]
    fn test_credit_overflow_is_reported() {
        let mut account = account();
        account.balance = Decimal::MAX;

        let result = account.credit(Decimal::ONE, "deposit");

        assert_eq!(result, Err(LedgerError::arithmetic_overflow("deposit", "ACC1")));
        assert_eq!(account.balance, Decimal::MAX);
    }

    #[rstest]
    #[case::active(AccountStatus::Active, true)]
    #[case::frozen(AccountStatus::Frozen, false)]
    #[case::closed(AccountStatus::Closed, false)]
    fn test_ensure_active(#[case] status: AccountStatus, #[case] ok: bool) {
        let mut account = account();
        account.status = status;

        assert_eq!(account.ensure_active().is_ok(), ok);
    }

    #[rstest]
    #[case("active", AccountStatus::Active)]
    #[case("FROZEN", AccountStatus::Frozen)]
    #[case(" closed ", AccountStatus::Closed)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: AccountStatus) {
        assert_eq!(input.parse::<AccountStatus>().unwrap(), expected);
    }

    #[test]
    fn test_account_type_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&AccountType::FixedDeposit).unwrap();
        assert_eq!(json, "\"FIXED_DEPOSIT\"");
    }
}
