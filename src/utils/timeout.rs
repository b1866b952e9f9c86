use std::future::Future;
use std::time::Duration;

use crate::domain::customer::CustomerError;

// ============================================================================
// Collaborator Timeouts
// ============================================================================
//
// Every call into storage or the user directory is bounded. An elapsed bound
// surfaces as `Unavailable`, never as a domain-specific failure.
//
// ============================================================================

pub async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, CustomerError>
where
    F: Future<Output = Result<T, CustomerError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                limit_ms = limit.as_millis() as u64,
                "Collaborator call timed out"
            );
            Err(CustomerError::Unavailable { operation })
        }
    }
}
