//! Query errors.

use poa_core::ErrorKind;
use poa_storage::StorageError;
use thiserror::Error;

/// Errors returned by the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown query route: {0}")]
    UnknownRoute(String),

    #[error("malformed address {0:?}")]
    MalformedAddress(String),

    #[error("bad request: {0}")]
    BadRequest(#[source] serde_json::Error),

    #[error("could not encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::UnknownRoute(_)
            | QueryError::MalformedAddress(_)
            | QueryError::BadRequest(_) => ErrorKind::Validation,
            QueryError::NotFound(_) => ErrorKind::NotFound,
            QueryError::Storage(_) => ErrorKind::StoreFailure,
            QueryError::Encode(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<u64>("not json").unwrap_err()
    }

    #[test]
    fn test_encode_failure_is_not_a_store_failure() {
        assert_eq!(QueryError::Encode(json_error()).kind(), ErrorKind::Internal);
        assert_eq!(QueryError::BadRequest(json_error()).kind(), ErrorKind::Validation);
        assert_eq!(
            QueryError::NotFound("validator".to_string()).kind(),
            ErrorKind::NotFound
        );
    }
}
