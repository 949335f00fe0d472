//! Error categories shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a failure, used by callers to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The target of a lookup does not exist. Not a system fault.
    NotFound,
    /// Malformed input or a duplicate submission.
    Validation,
    /// The sender has no standing for the action.
    Authorization,
    /// Support was present but a governance rule blocked the outcome.
    PolicyViolation,
    /// The underlying store failed.
    StoreFailure,
    /// A value read from the store could not be rendered for the caller.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::PolicyViolation => "policy violation",
            ErrorKind::StoreFailure => "store failure",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
