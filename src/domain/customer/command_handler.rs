use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::messaging::Mailer;
use crate::metrics::Metrics;
use crate::utils::with_timeout;

use super::access::AccessScoper;
use super::aggregate::Customer;
use super::commands::PatchOperation;
use super::criteria::Criterion;
use super::errors::CustomerError;
use super::events::CustomerCreated;
use super::patch::apply_patch;
use super::ports::{CustomerRepository, UserDirectory};
use super::value_objects::{Email, ROLE_CUSTOMER};
use super::version::check_version;

// ============================================================================
// Customer Service
// ============================================================================
//
// Orchestrates reads, create, full update, patch and delete:
//   load → access check (patch) → version check → candidate → validate
//        → email uniqueness (only if changed) → compare-and-swap save
//
// Every collaborator call is bounded by a timeout. "Not found" is `Ok(None)`.
//
// ============================================================================

pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
    directory: Arc<dyn UserDirectory>,
    scoper: AccessScoper,
    mailer: Arc<Mailer>,
    metrics: Arc<Metrics>,
    config: ServiceConfig,
}

impl CustomerService {
    pub fn new(
        repo: Arc<dyn CustomerRepository>,
        directory: Arc<dyn UserDirectory>,
        mailer: Arc<Mailer>,
        metrics: Arc<Metrics>,
        config: ServiceConfig,
    ) -> Self {
        let scoper = AccessScoper::new(directory.clone());
        Self {
            repo,
            directory,
            scoper,
            mailer,
            metrics,
            config,
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Customer with the given id, if `username` may read it
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str, username: &str) -> Result<Option<Customer>, CustomerError> {
        self.observed("find_by_id", async {
            let Some(customer) = self.load(id).await? else {
                return Ok(None);
            };
            self.check_read(&customer, username).await?;
            Ok(Some(customer))
        })
        .await
    }

    /// Customers matching all query parameters; no parameters lists everyone
    #[instrument(skip(self))]
    pub async fn find(&self, params: &[(&str, &str)]) -> Result<Vec<Customer>, CustomerError> {
        self.observed("find", async {
            let limit = self.config.timeout_long();
            if params.is_empty() {
                return with_timeout("find_all", limit, self.repo.find_all()).await;
            }

            let Some(criteria) = Criterion::from_params(params.iter().copied()) else {
                tracing::debug!(?params, "Unknown or invalid query parameter");
                return Ok(Vec::new());
            };
            let found = with_timeout("find_by_criteria", limit, self.repo.find_by_criteria(&criteria)).await?;
            tracing::debug!(found = found.len(), "Customers found");
            Ok(found)
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Register a new customer together with its login
    #[instrument(skip(self, customer), fields(email = %customer.email))]
    pub async fn create(&self, customer: Customer) -> Result<Customer, CustomerError> {
        self.observed("create", async {
            customer.validate(Utc::now().date_naive())?;

            let account = customer
                .user
                .clone()
                .filter(|user| !user.username.trim().is_empty())
                .ok_or(CustomerError::InvalidAccount)?;

            let limit = self.config.timeout_short();
            let email = customer.email.normalized();
            if with_timeout("exists_by_email", limit, self.repo.exists_by_email(&email, None)).await? {
                return Err(CustomerError::EmailExists(email));
            }

            let account = account.with_roles(&[ROLE_CUSTOMER]);
            let account = with_timeout("create_user", limit, self.directory.create_user(account)).await?;

            let candidate = Customer {
                id: Some(Uuid::new_v4()),
                version: None,
                email: Email::new(email),
                username: Some(account.username.clone()),
                ..customer
            };
            let mut saved = match with_timeout("save", limit, self.repo.save(candidate)).await {
                Ok(saved) => saved,
                Err(err) => {
                    self.discard_login(&account.username).await;
                    return Err(err);
                }
            };
            saved.user = Some(account);
            tracing::debug!(customer_id = ?saved.id, "Customer created");

            if let Some(event) = CustomerCreated::from_customer(&saved) {
                self.mailer.send(&event).await;
            }
            Ok(saved)
        })
        .await
    }

    /// Replace the business fields of customer `id` with those of `candidate`.
    ///
    /// `version_token` must not be older than the stored version.
    #[instrument(skip(self, candidate))]
    pub async fn update(
        &self,
        candidate: Customer,
        id: &str,
        version_token: &str,
    ) -> Result<Option<Customer>, CustomerError> {
        self.observed("update", async {
            let Some(stored) = self.load(id).await? else {
                return Ok(None);
            };
            check_version(version_token, stored.version)?;

            let candidate = stored.merged_with(&candidate);
            self.store_changed(&stored, candidate).await.map(Some)
        })
        .await
    }

    /// Apply `operations` to customer `id` on behalf of `username`
    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    pub async fn patch(
        &self,
        id: &str,
        username: &str,
        operations: &[PatchOperation],
        version_token: &str,
    ) -> Result<Option<Customer>, CustomerError> {
        self.observed("patch", async {
            let Some(stored) = self.load(id).await? else {
                return Ok(None);
            };
            self.check_read(&stored, username).await?;
            check_version(version_token, stored.version)?;

            for operation in operations {
                self.metrics.record_patch_operation(operation.op.as_str());
            }
            let candidate = apply_patch(&stored, operations)?;
            self.store_changed(&stored, candidate).await.map(Some)
        })
        .await
    }

    /// Remove customer `id`, returning the removed document
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<Option<Customer>, CustomerError> {
        self.observed("delete_by_id", async {
            let Some(id) = parse_id(id) else {
                return Ok(None);
            };
            let deleted =
                with_timeout("delete_by_id", self.config.timeout_short(), self.repo.delete_by_id(id)).await?;
            tracing::debug!(customer_id = %id, deleted = deleted.is_some(), "Delete by id");
            Ok(deleted)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_by_email(&self, email: &str) -> Result<bool, CustomerError> {
        self.observed("delete_by_email", async {
            let deleted = with_timeout(
                "delete_by_email",
                self.config.timeout_short(),
                self.repo.delete_by_email(email),
            )
            .await?;
            tracing::debug!(deleted, "Delete by email");
            Ok(deleted)
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Flow steps
    // ------------------------------------------------------------------------

    async fn load(&self, id: &str) -> Result<Option<Customer>, CustomerError> {
        let Some(id) = parse_id(id) else {
            tracing::debug!(id, "Malformed customer id");
            return Ok(None);
        };
        let found = with_timeout("find_by_id", self.config.timeout_short(), self.repo.find_by_id(id)).await?;
        if found.is_none() {
            tracing::debug!(customer_id = %id, "Customer not found");
        }
        Ok(found)
    }

    /// Undo the login registered for a customer that could not be stored
    async fn discard_login(&self, username: &str) {
        let removed = with_timeout(
            "delete_user",
            self.config.timeout_short(),
            self.directory.delete_user(username),
        )
        .await;
        match removed {
            Ok(_) => tracing::debug!(username, "Login of unsaved customer removed"),
            Err(err) => tracing::error!(username, error = %err, "Failed to remove login of unsaved customer"),
        }
    }

    async fn check_read(&self, customer: &Customer, username: &str) -> Result<(), CustomerError> {
        with_timeout(
            "find_roles_for_username",
            self.config.timeout_short(),
            self.scoper.check_read(customer.username.as_deref(), username),
        )
        .await
    }

    /// Validate the candidate, re-check the email only if it changed, save
    async fn store_changed(&self, stored: &Customer, candidate: Customer) -> Result<Customer, CustomerError> {
        candidate.validate(Utc::now().date_naive())?;

        let limit = self.config.timeout_short();
        if candidate.email != stored.email {
            tracing::trace!(from = %stored.email, to = %candidate.email, "Email changed");
            let taken = with_timeout(
                "exists_by_email",
                limit,
                self.repo.exists_by_email(candidate.email.as_str(), stored.id),
            )
            .await?;
            if taken {
                return Err(CustomerError::EmailExists(candidate.email.as_str().to_string()));
            }
        } else {
            tracing::trace!(email = %stored.email, "Email unchanged");
        }

        let saved = with_timeout("save", limit, self.repo.save(candidate)).await?;
        tracing::trace!(customer_id = ?saved.id, version = ?saved.version, "Customer updated");
        Ok(saved)
    }

    /// Run a flow, recording its outcome and latency
    async fn observed<T, F>(&self, operation: &'static str, flow: F) -> Result<T, CustomerError>
    where
        F: Future<Output = Result<T, CustomerError>>,
    {
        let started = Instant::now();
        let result = flow.await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) if err.is_client_error() => {
                tracing::debug!(operation, error = %err, "Request rejected");
                err.kind()
            }
            Err(err) => {
                tracing::error!(operation, error = %err, "Operation failed");
                err.kind()
            }
        };
        if matches!(
            result,
            Err(CustomerError::InvalidVersion(_) | CustomerError::ConcurrentModification { .. })
        ) {
            self.metrics.record_version_conflict();
        }
        self.metrics
            .record_operation(operation, outcome, started.elapsed().as_secs_f64());
        result
    }
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}
