use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::aggregate::Customer;
use super::criteria::Criterion;
use super::errors::CustomerError;
use super::value_objects::UserAccount;

// ============================================================================
// Customer Ports - contracts of the external collaborators
// ============================================================================

/// Document storage for customers.
///
/// Every method is atomic for a single document. `save` is a compare-and-swap
/// on the version: see [`CustomerRepository::save`].
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerError>;

    async fn find_all(&self) -> Result<Vec<Customer>, CustomerError>;

    /// Customers matching every criterion
    async fn find_by_criteria(&self, criteria: &[Criterion]) -> Result<Vec<Customer>, CustomerError>;

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, CustomerError>;

    /// Whether a customer other than `excluding` holds `email`, compared
    /// case-insensitively.
    async fn exists_by_email(
        &self,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, CustomerError>;

    /// Persist `customer` and return the stored value.
    ///
    /// Without an id or version the customer is inserted with version 0.
    /// Otherwise it replaces the stored document only if that document still
    /// has the same version, and the stored version becomes `version + 1`;
    /// a mismatch fails with `ConcurrentModification`.
    async fn save(&self, customer: Customer) -> Result<Customer, CustomerError>;

    /// Remove a customer, returning the removed document
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerError>;

    async fn delete_by_email(&self, email: &str) -> Result<bool, CustomerError>;

    async fn count(&self) -> Result<u64, CustomerError>;

    /// Distinct last names starting with `prefix` (case-insensitive), sorted
    async fn last_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError>;

    /// Distinct emails starting with `prefix` (case-insensitive), sorted
    async fn emails_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError>;
}

/// Directory of login accounts and their roles
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_roles_for_username(
        &self,
        username: &str,
    ) -> Result<Option<BTreeSet<String>>, CustomerError>;

    /// Register a new login; fails with `UsernameExists` if taken
    async fn create_user(&self, account: UserAccount) -> Result<UserAccount, CustomerError>;

    /// Remove a login; `false` if there was none
    async fn delete_user(&self, username: &str) -> Result<bool, CustomerError>;
}

/// Binary file attached to a customer
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub customer_id: Uuid,
    pub content_type: String,
    pub data: Bytes,
}

/// Binary storage for customer media, one file per customer
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find(&self, customer_id: Uuid) -> Result<Option<Media>, CustomerError>;

    async fn delete(&self, customer_id: Uuid) -> Result<bool, CustomerError>;

    async fn store(&self, media: Media) -> Result<Media, CustomerError>;
}
