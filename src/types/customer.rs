//! Customer records held by the customer directory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer identifier (uuid v4 string)
pub type CustomerId = String;

/// Contact details supplied when a customer is registered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// A registered customer
///
/// Accounts refer to customers by [`CustomerId`] only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: CustomerId,
    #[serde(flatten)]
    pub profile: CustomerProfile,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn register(profile: CustomerProfile) -> Self {
        Customer {
            customer_id: Uuid::new_v4().to_string(),
            profile,
            created_at: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
            .trim()
            .to_string()
    }
}
