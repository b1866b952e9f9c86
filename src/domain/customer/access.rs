use std::sync::Arc;

use super::errors::CustomerError;
use super::ports::UserDirectory;
use super::value_objects::ROLE_ADMIN;

// ============================================================================
// Access Scoper - read permission by ownership or role
// ============================================================================

#[derive(Clone)]
pub struct AccessScoper {
    directory: Arc<dyn UserDirectory>,
}

impl AccessScoper {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Permit the caller to read a customer owned by `owner`.
    ///
    /// Owners always pass without a directory lookup. Anyone else needs the
    /// admin role; an unknown caller holds no roles.
    pub async fn check_read(&self, owner: Option<&str>, caller: &str) -> Result<(), CustomerError> {
        if owner == Some(caller) {
            return Ok(());
        }

        let roles = self
            .directory
            .find_roles_for_username(caller)
            .await?
            .unwrap_or_default();

        if roles.contains(ROLE_ADMIN) {
            tracing::trace!(caller, "Read permitted by admin role");
            return Ok(());
        }

        tracing::debug!(caller, ?roles, "Read forbidden");
        Err(CustomerError::AccessForbidden { roles })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::customer::value_objects::UserAccount;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Directory that must never be reached
    pub(crate) struct UnreachableDirectory {
        pub calls: AtomicU32,
    }

    impl UnreachableDirectory {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl UserDirectory for UnreachableDirectory {
        async fn find_roles_for_username(
            &self,
            _username: &str,
        ) -> Result<Option<BTreeSet<String>>, CustomerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CustomerError::Unavailable {
                operation: "find_roles_for_username",
            })
        }

        async fn create_user(&self, _account: UserAccount) -> Result<UserAccount, CustomerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CustomerError::Unavailable {
                operation: "create_user",
            })
        }

        async fn delete_user(&self, _username: &str) -> Result<bool, CustomerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CustomerError::Unavailable {
                operation: "delete_user",
            })
        }
    }

    struct FixedDirectory(Option<BTreeSet<String>>);

    #[async_trait]
    impl UserDirectory for FixedDirectory {
        async fn find_roles_for_username(
            &self,
            _username: &str,
        ) -> Result<Option<BTreeSet<String>>, CustomerError> {
            Ok(self.0.clone())
        }

        async fn create_user(&self, account: UserAccount) -> Result<UserAccount, CustomerError> {
            Ok(account)
        }

        async fn delete_user(&self, _username: &str) -> Result<bool, CustomerError> {
            Ok(false)
        }
    }

    fn roles(names: &[&str]) -> Option<BTreeSet<String>> {
        Some(names.iter().map(|r| r.to_string()).collect())
    }

    #[tokio::test]
    async fn test_owner_bypasses_directory() {
        let directory = Arc::new(UnreachableDirectory::new());
        let scoper = AccessScoper::new(directory.clone());

        scoper.check_read(Some("alpha1"), "alpha1").await.unwrap();
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_admin_may_read_foreign_customer() {
        let scoper = AccessScoper::new(Arc::new(FixedDirectory(roles(&[
            "ROLE_ADMIN",
            "ROLE_KUNDE",
        ]))));
        assert!(scoper.check_read(Some("alpha1"), "admin").await.is_ok());
    }

    #[tokio::test]
    async fn test_non_admin_forbidden_with_held_roles() {
        let scoper = AccessScoper::new(Arc::new(FixedDirectory(roles(&["ROLE_KUNDE"]))));
        let err = scoper.check_read(Some("alpha1"), "alpha2").await.unwrap_err();
        match err {
            CustomerError::AccessForbidden { roles } => {
                assert_eq!(roles, BTreeSet::from(["ROLE_KUNDE".to_string()]));
            }
            other => panic!("expected AccessForbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_caller_and_unowned_customer() {
        let scoper = AccessScoper::new(Arc::new(FixedDirectory(None)));
        let err = scoper.check_read(None, "ghost").await.unwrap_err();
        assert!(matches!(err, CustomerError::AccessForbidden { ref roles } if roles.is_empty()));
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let scoper = AccessScoper::new(Arc::new(UnreachableDirectory::new()));
        let err = scoper.check_read(Some("alpha1"), "admin").await.unwrap_err();
        assert!(matches!(err, CustomerError::Unavailable { .. }));
    }
}
