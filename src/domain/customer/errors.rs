use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

// ============================================================================
// Customer Errors
// ============================================================================

/// A single failed validation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub property: &'static str,
    pub message: String,
}

impl ConstraintViolation {
    pub fn new(property: &'static str, message: impl Into<String>) -> Self {
        Self {
            property,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

fn join_violations(violations: &[ConstraintViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Invalid version number: {0}")]
    InvalidVersion(String),

    #[error("Email address {0} already exists")]
    EmailExists(String),

    #[error("Patch value {value:?} for {path} is not a valid {expected}")]
    PatchTypeMismatch {
        path: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unsupported patch operation: {op} {path}")]
    UnsupportedPatchOperation { op: String, path: String },

    /// Carries the roles actually held, for logging only
    #[error("Access forbidden")]
    AccessForbidden { roles: BTreeSet<String> },

    #[error("Constraint violations: {}", join_violations(.0))]
    ConstraintViolations(Vec<ConstraintViolation>),

    #[error("Invalid account data")]
    InvalidAccount,

    #[error("Username {0} already exists")]
    UsernameExists(String),

    #[error("Customer {id} was modified concurrently (expected version {expected_version})")]
    ConcurrentModification { id: Uuid, expected_version: i64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Collaborator unavailable during {operation}")]
    Unavailable { operation: &'static str },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CustomerError {
    pub fn patch_type_mismatch(
        path: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::PatchTypeMismatch {
            path: path.into(),
            value: value.into(),
            expected,
        }
    }

    pub fn unsupported_patch(op: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnsupportedPatchOperation {
            op: op.into(),
            path: path.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidVersion(_) => "invalid_version",
            Self::EmailExists(_) => "email_exists",
            Self::PatchTypeMismatch { .. } => "patch_type_mismatch",
            Self::UnsupportedPatchOperation { .. } => "unsupported_patch_operation",
            Self::AccessForbidden { .. } => "access_forbidden",
            Self::ConstraintViolations(_) => "constraint_violations",
            Self::InvalidAccount => "invalid_account",
            Self::UsernameExists(_) => "username_exists",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::Unavailable { .. } => "unavailable",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the failure was caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Unavailable { .. } | Self::Storage(_))
    }
}
