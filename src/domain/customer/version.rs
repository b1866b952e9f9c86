use super::errors::CustomerError;

// ============================================================================
// Optimistic Concurrency - Version Check
// ============================================================================

/// Reject a caller-supplied version token that is unparsable or older than
/// the stored version. A token equal to or newer than the stored version
/// passes.
///
/// The token is read exactly as sent: a 32-bit integer, no surrounding
/// whitespace.
pub fn check_version(token: &str, stored_version: Option<i64>) -> Result<(), CustomerError> {
    let version = token
        .parse::<i32>()
        .map(i64::from)
        .map_err(|_| CustomerError::InvalidVersion(token.to_string()))?;

    let stored = stored_version.unwrap_or(0);
    if version < stored {
        tracing::debug!(token, stored, "Stale version token");
        return Err(CustomerError::InvalidVersion(token.to_string()));
    }

    Ok(())
}
