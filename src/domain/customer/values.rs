use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::utils::with_timeout;

use super::errors::CustomerError;
use super::ports::CustomerRepository;

// ============================================================================
// Value Lookups - single values for autocompletion and cheap polling
// ============================================================================

pub struct CustomerValuesService {
    repo: Arc<dyn CustomerRepository>,
    config: ServiceConfig,
}

impl CustomerValuesService {
    pub fn new(repo: Arc<dyn CustomerRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    pub async fn count(&self) -> Result<u64, CustomerError> {
        with_timeout("count", self.config.timeout_short(), self.repo.count()).await
    }

    #[instrument(skip(self))]
    pub async fn last_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError> {
        with_timeout(
            "last_names_by_prefix",
            self.config.timeout_long(),
            self.repo.last_names_by_prefix(prefix),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn emails_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CustomerError> {
        with_timeout(
            "emails_by_prefix",
            self.config.timeout_long(),
            self.repo.emails_by_prefix(prefix),
        )
        .await
    }

    /// Current version of a customer, so clients can refresh their token
    /// without fetching the document
    #[instrument(skip(self))]
    pub async fn version_by_id(&self, id: &str) -> Result<Option<i64>, CustomerError> {
        let Ok(id) = Uuid::parse_str(id.trim()) else {
            return Ok(None);
        };
        let customer = with_timeout("find_by_id", self.config.timeout_short(), self.repo.find_by_id(id)).await?;
        Ok(customer.map(|c| c.stored_version()))
    }
}
