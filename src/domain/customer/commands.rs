use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Customer Patch Commands
// ============================================================================

/// Kind of a single field-level edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
    Add,
    Remove,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Replace => "replace",
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit instruction from a PATCH request, e.g.
/// `{"op": "add", "path": "/interessen", "value": "S"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: String,
}

impl PatchOperation {
    pub fn new(op: PatchOp, path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PatchOp::Replace, path, value)
    }

    pub fn add(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PatchOp::Add, path, value)
    }

    pub fn remove(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(PatchOp::Remove, path, value)
    }
}
