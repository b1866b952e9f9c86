use std::sync::Arc;

use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::utils::with_timeout;

use super::errors::CustomerError;
use super::ports::{CustomerRepository, Media, MediaStore};

// ============================================================================
// Customer Multimedia
// ============================================================================

const ACCEPTED_MEDIA_PREFIXES: [&str; 2] = ["image/", "video/"];

pub struct MultimediaService {
    repo: Arc<dyn CustomerRepository>,
    store: Arc<dyn MediaStore>,
    config: ServiceConfig,
}

impl MultimediaService {
    pub fn new(repo: Arc<dyn CustomerRepository>, store: Arc<dyn MediaStore>, config: ServiceConfig) -> Self {
        Self { repo, store, config }
    }

    /// Stored file of an existing customer
    #[instrument(skip(self))]
    pub async fn find_media(&self, customer_id: &str) -> Result<Option<Media>, CustomerError> {
        let Some(id) = self.existing_customer(customer_id).await? else {
            return Ok(None);
        };
        with_timeout("find_media", self.config.timeout_short(), self.store.find(id)).await
    }

    /// Replace the file of an existing customer. `None` if there is no such
    /// customer.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn save(
        &self,
        customer_id: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Option<Media>, CustomerError> {
        if !ACCEPTED_MEDIA_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
        {
            return Err(CustomerError::UnsupportedMediaType(content_type.to_string()));
        }

        let Some(id) = self.existing_customer(customer_id).await? else {
            return Ok(None);
        };

        let media = Media {
            customer_id: id,
            content_type: content_type.to_string(),
            data,
        };
        let stored = with_timeout("store_media", self.config.timeout_short(), self.store.store(media)).await?;
        tracing::debug!(customer_id = %id, content_type, "Media stored");
        Ok(Some(stored))
    }

    async fn existing_customer(&self, customer_id: &str) -> Result<Option<Uuid>, CustomerError> {
        let Ok(id) = Uuid::parse_str(customer_id.trim()) else {
            return Ok(None);
        };
        let exists = with_timeout("exists_by_id", self.config.timeout_short(), self.repo.exists_by_id(id)).await?;
        Ok(exists.then_some(id))
    }
}
