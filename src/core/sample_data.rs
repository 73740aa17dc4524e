//! Demo data for a fresh ledger
//!
//! Registers three customers, opens one account each and funds them through
//! ordinary audited deposits performed by the `SYSTEM` actor.

use super::ledger_service::LedgerService;
use crate::types::{Account, AccountType, CustomerProfile, LedgerError};
use rust_decimal::Decimal;
use tracing::info;

/// Actor recorded for seeded operations
pub const SYSTEM_ACTOR: &str = "SYSTEM";

struct SampleCustomer {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    mobile_number: &'static str,
    address: &'static str,
    city: &'static str,
    state: &'static str,
    pincode: &'static str,
    account_type: AccountType,
    opening_balance: i64,
}

const SAMPLE_CUSTOMERS: [SampleCustomer; 3] = [
    SampleCustomer {
        first_name: "Rajesh",
        last_name: "Kumar",
        email: "rajesh.kumar@email.com",
        mobile_number: "9876543210",
        address: "123 MG Road",
        city: "Mumbai",
        state: "Maharashtra",
        pincode: "400001",
        account_type: AccountType::Savings,
        opening_balance: 50_000,
    },
    SampleCustomer {
        first_name: "Priya",
        last_name: "Sharma",
        email: "priya.sharma@email.com",
        mobile_number: "9876543211",
        address: "456 Brigade Road",
        city: "Bangalore",
        state: "Karnataka",
        pincode: "560001",
        account_type: AccountType::Current,
        opening_balance: 100_000,
    },
    SampleCustomer {
        first_name: "Amit",
        last_name: "Patel",
        email: "amit.patel@email.com",
        mobile_number: "9876543212",
        address: "789 Park Street",
        city: "Kolkata",
        state: "West Bengal",
        pincode: "700016",
        account_type: AccountType::Savings,
        opening_balance: 75_000,
    },
];

/// Seed the ledger with the sample customers and funded accounts
///
/// # Returns
///
/// The funded accounts, in seeding order
pub async fn seed(service: &LedgerService) -> Result<Vec<Account>, LedgerError> {
    let mut accounts = Vec::with_capacity(SAMPLE_CUSTOMERS.len());
    for sample in &SAMPLE_CUSTOMERS {
        let customer = service
            .create_customer(
                CustomerProfile {
                    first_name: sample.first_name.to_string(),
                    last_name: sample.last_name.to_string(),
                    email: sample.email.to_string(),
                    mobile_number: sample.mobile_number.to_string(),
                    address: sample.address.to_string(),
                    city: sample.city.to_string(),
                    state: sample.state.to_string(),
                    pincode: sample.pincode.to_string(),
                },
                SYSTEM_ACTOR,
            )
            .await?;
        let account = service
            .open_account(&customer.customer_id, sample.account_type, SYSTEM_ACTOR)
            .await?;
        service
            .deposit(
                &account.account_number,
                Decimal::new(sample.opening_balance, 0),
                "Initial deposit",
                SYSTEM_ACTOR,
            )
            .await?;
        accounts.push(service.account(&account.account_number)?);
    }
    info!(accounts = accounts.len(), "Sample data seeded");
    Ok(accounts)
}
