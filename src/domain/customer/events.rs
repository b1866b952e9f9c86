use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::Customer;

// ============================================================================
// Customer Notifications
// ============================================================================

/// Fact emitted after a customer has been stored for the first time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub customer_id: Uuid,
    pub last_name: String,
    pub email: String,
}

impl CustomerCreated {
    /// `None` for a customer that has not been saved yet
    pub fn from_customer(customer: &Customer) -> Option<Self> {
        Some(Self {
            customer_id: customer.id?,
            last_name: customer.last_name.clone(),
            email: customer.email.as_str().to_string(),
        })
    }
}
