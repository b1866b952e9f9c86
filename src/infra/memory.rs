use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::customer::{
    Criterion, Customer, CustomerError, CustomerRepository, Media, MediaStore, UserAccount,
    UserDirectory,
};

// ============================================================================
// In-Memory Collaborators
// ============================================================================
//
// Process-local implementations of the ports. Each document is replaced as a
// whole under the write lock, which gives the per-document atomicity and the
// compare-and-swap `save` the service relies on.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn distinct_by_prefix<F>(customers: &HashMap<Uuid, Customer>, prefix: &str, field: F) -> Vec<String>
    where
        F: Fn(&Customer) -> &str,
    {
        let prefix = prefix.to_lowercase();
        customers
            .values()
            .map(|c| field(c))
            .filter(|value| value.to_lowercase().starts_with(&prefix))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Customer>, CustomerError> {
        let mut all: Vec<_> = self.customers.read().await.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn find_by_criteria(&self, criteria: &[Criterion]) -> Result<Vec<Customer>, CustomerError> {
        let mut found: Vec<_> = self
            .customers
            .read()
            .await
            .values()
            .filter(|c| Criterion::matches_all(criteria, c))
            .cloned()
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, CustomerError> {
        Ok(self.customers.read().await.contains_key(&id))
    }

    async fn exists_by_email(
        &self,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, CustomerError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .any(|c| c.email.eq_ignore_case(email) && c.id != excluding))
    }

    async fn save(&self, mut customer: Customer) -> Result<Customer, CustomerError> {
        let mut customers = self.customers.write().await;
        let now = Utc::now();
        customer.user = None;

        match (customer.id, customer.version) {
            (Some(id), Some(expected_version)) => {
                let stored = customers
                    .get(&id)
                    .ok_or(CustomerError::ConcurrentModification { id, expected_version })?;
                if stored.version != Some(expected_version) {
                    tracing::debug!(
                        customer_id = %id,
                        expected_version,
                        stored_version = ?stored.version,
                        "Compare-and-swap lost"
                    );
                    return Err(CustomerError::ConcurrentModification { id, expected_version });
                }
                customer.version = Some(expected_version + 1);
                customer.created_at = stored.created_at;
                customer.updated_at = Some(now);
            }
            (id, _) => {
                let id = id.unwrap_or_else(Uuid::new_v4);
                if customers.contains_key(&id) {
                    return Err(CustomerError::storage(format!("customer {id} already exists")));
                }
                customer.id = Some(id);
                customer.version = Some(0);
                customer.created_at = Some(now);
                customer.updated_at = Some(now);
            }
        }

        let id = customer.id.ok_or_else(|| CustomerError::storage("customer without id"))?;
        customers.insert(id, customer.clone());
        tracing::trace!(customer_id = %id, version = ?customer.version, "Customer stored");
        Ok(customer)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerError> {
        Ok(self.customers.write().await.remove(&id))
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, CustomerError> {
        let mut customers = self.customers.write().await;
        let id = customers
            .values()
            .find(|c| c.email.eq_ignore_case(email))
            .and_then(|c| c.id);
        Ok(id.and_then(|id| customers.remove(&id)).is_some())
    }

    async fn count(&self) -> Result<u64, CustomerError> {
        Ok(self.customers.read().await.len() as u64)
    }

    async fn last_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError> {
        let customers = self.customers.read().await;
        Ok(Self::distinct_by_prefix(&customers, prefix, |c| c.last_name.as_str()))
    }

    async fn emails_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError> {
        let customers = self.customers.read().await;
        Ok(Self::distinct_by_prefix(&customers, prefix, |c| c.email.as_str()))
    }
}

/// Login accounts keyed by username
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserAccount>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_roles_for_username(
        &self,
        username: &str,
    ) -> Result<Option<BTreeSet<String>>, CustomerError> {
        Ok(self
            .users
            .read()
            .await
            .get(username)
            .map(|user| user.roles.iter().cloned().collect()))
    }

    async fn create_user(&self, account: UserAccount) -> Result<UserAccount, CustomerError> {
        let mut users = self.users.write().await;
        if users.contains_key(&account.username) {
            return Err(CustomerError::UsernameExists(account.username));
        }
        users.insert(account.username.clone(), account.clone());
        Ok(account)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, CustomerError> {
        Ok(self.users.write().await.remove(username).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryMediaStore {
    files: RwLock<HashMap<Uuid, Media>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn find(&self, customer_id: Uuid) -> Result<Option<Media>, CustomerError> {
        Ok(self.files.read().await.get(&customer_id).cloned())
    }

    async fn delete(&self, customer_id: Uuid) -> Result<bool, CustomerError> {
        Ok(self.files.write().await.remove(&customer_id).is_some())
    }

    async fn store(&self, media: Media) -> Result<Media, CustomerError> {
        self.files
            .write()
            .await
            .insert(media.customer_id, media.clone());
        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::aggregate::tests::create_test_customer;
    use crate::domain::customer::{Email, ROLE_CUSTOMER};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_insert_assigns_id_and_version_zero() {
        let repo = InMemoryCustomerRepository::new();
        let saved = repo.save(create_test_customer()).await.unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.version, Some(0));
        assert!(saved.created_at.is_some());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_increments_version() {
        let repo = InMemoryCustomerRepository::new();
        let mut saved = repo.save(create_test_customer()).await.unwrap();
        let created_at = saved.created_at;

        saved.category = 5;
        let updated = repo.save(saved).await.unwrap();

        assert_eq!(updated.version, Some(1));
        assert_eq!(updated.created_at, created_at);
        let stored = repo.find_by_id(updated.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.category, 5);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let repo = InMemoryCustomerRepository::new();
        let saved = repo.save(create_test_customer()).await.unwrap();
        let stale = saved.clone();

        repo.save(saved).await.unwrap();
        let result = repo.save(stale).await;

        assert!(matches!(
            result,
            Err(CustomerError::ConcurrentModification { expected_version: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_user_is_not_stored() {
        let repo = InMemoryCustomerRepository::new();
        let mut customer = create_test_customer();
        customer.user = Some(UserAccount::new("alpha1", "p"));

        let saved = repo.save(customer).await.unwrap();
        assert!(saved.user.is_none());
    }

    #[tokio::test]
    async fn test_exists_by_email_ignores_case_and_excluded_id() {
        let repo = InMemoryCustomerRepository::new();
        let saved = repo.save(create_test_customer()).await.unwrap();

        assert!(repo.exists_by_email("ALPHA@test.de", None).await.unwrap());
        assert!(!repo.exists_by_email("alpha@test.de", saved.id).await.unwrap());
        assert!(!repo.exists_by_email("other@test.de", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_prefix_lookups_are_distinct_and_sorted() {
        let repo = InMemoryCustomerRepository::new();
        for email in ["alpha@test.de", "alpha@test.ch", "beta@test.de"] {
            let mut customer = create_test_customer();
            customer.email = Email::new(email);
            if email.starts_with("beta") {
                customer.last_name = "Beta".to_string();
            }
            repo.save(customer).await.unwrap();
        }

        assert_eq!(repo.last_names_by_prefix("a").await.unwrap(), vec!["Alpha"]);
        assert_eq!(
            repo.emails_by_prefix("AL").await.unwrap(),
            vec!["alpha@test.ch", "alpha@test.de"]
        );
    }

    #[tokio::test]
    async fn test_delete_by_email() {
        let repo = InMemoryCustomerRepository::new();
        repo.save(create_test_customer()).await.unwrap();

        assert!(repo.delete_by_email("alpha@test.de").await.unwrap());
        assert!(!repo.delete_by_email("alpha@test.de").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_directory_rejects_duplicate_username() {
        let directory = InMemoryUserDirectory::new();
        let account = UserAccount::new("neu", "p").with_roles(&[ROLE_CUSTOMER]);
        directory.create_user(account.clone()).await.unwrap();

        let roles = directory.find_roles_for_username("neu").await.unwrap().unwrap();
        assert!(roles.contains(ROLE_CUSTOMER));
        assert!(matches!(
            directory.create_user(account).await,
            Err(CustomerError::UsernameExists(name)) if name == "neu"
        ));
        assert!(directory.find_roles_for_username("nobody").await.unwrap().is_none());

        assert!(directory.delete_user("neu").await.unwrap());
        assert!(!directory.delete_user("neu").await.unwrap());
        assert!(directory.find_roles_for_username("neu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_media_store_replaces_file() {
        let store = InMemoryMediaStore::new();
        let id = Uuid::new_v4();
        store
            .store(Media {
                customer_id: id,
                content_type: "image/png".to_string(),
                data: Bytes::from_static(b"png"),
            })
            .await
            .unwrap();
        store
            .store(Media {
                customer_id: id,
                content_type: "video/mp4".to_string(),
                data: Bytes::from_static(b"mp4"),
            })
            .await
            .unwrap();

        let media = store.find(id).await.unwrap().unwrap();
        assert_eq!(media.content_type, "video/mp4");
        assert!(store.delete(id).await.unwrap());
        assert!(store.find(id).await.unwrap().is_none());
    }
}
