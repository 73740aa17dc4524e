//! Customer directory
//!
//! Customers are registered once and never modified. Accounts reference them
//! by id; the directory only answers existence and lookup queries.

use crate::types::{Customer, LedgerError};
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct CustomerStore {
    customers: DashMap<String, Customer>,
}

impl CustomerStore {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
        }
    }

    pub fn insert(&self, customer: Customer) {
        self.customers
            .insert(customer.customer_id.clone(), customer);
    }

    pub fn get(&self, customer_id: &str) -> Result<Customer, LedgerError> {
        self.customers
            .get(customer_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::customer_not_found(customer_id))
    }

    pub fn contains(&self, customer_id: &str) -> bool {
        self.customers.contains_key(customer_id)
    }

    /// All customers in registration order
    pub fn all(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        customers.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        customers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomerProfile;

    #[test]
    fn test_lookup_registered_customer() {
        let store = CustomerStore::new();
        let customer = Customer::register(CustomerProfile {
            first_name: "Amit".to_string(),
            ..CustomerProfile::default()
        });
        let id = customer.customer_id.clone();
        store.insert(customer);

        assert!(store.contains(&id));
        assert_eq!(store.get(&id).unwrap().profile.first_name, "Amit");
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_unknown_customer_is_not_found() {
        let store = CustomerStore::new();

        assert_eq!(
            store.get("missing"),
            Err(LedgerError::customer_not_found("missing"))
        );
    }
}
