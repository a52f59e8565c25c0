use thiserror::Error;

/// Closed classification of storage errors.
///
/// The client wrapper normalizes every raw SDK error into one of these
/// kinds, so nothing above it ever inspects error names or codes as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request throttled by the store.
    Throttled,
    /// Provisioned throughput or request limit exceeded.
    CapacityExceeded,
    /// Store-side internal error.
    Internal,
    /// Store temporarily unavailable.
    ServiceUnavailable,
    /// A conditional write's precondition did not hold.
    ConditionFailed,
    /// Table or index does not exist.
    ResourceNotFound,
    /// Caller is not authorized.
    AccessDenied,
    /// The store rejected the request shape.
    Validation,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Whether a call failing with this kind may be retried with backoff.
    ///
    /// Only transient kinds qualify; everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Throttled
                | ErrorKind::CapacityExceeded
                | ErrorKind::Internal
                | ErrorKind::ServiceUnavailable
        )
    }
}

/// A normalized storage error: kind, message, and HTTP status when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl StoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Throttled.is_retryable());
        assert!(ErrorKind::CapacityExceeded.is_retryable());
        assert!(ErrorKind::Internal.is_retryable());
        assert!(ErrorKind::ServiceUnavailable.is_retryable());

        assert!(!ErrorKind::ConditionFailed.is_retryable());
        assert!(!ErrorKind::ResourceNotFound.is_retryable());
        assert!(!ErrorKind::AccessDenied.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Other.is_retryable());
    }

    #[test]
    fn test_store_error_display() {
        let error = StoreError::new(ErrorKind::Throttled, "slow down").with_status(400);
        assert_eq!(error.to_string(), "Throttled: slow down");
        assert_eq!(error.http_status, Some(400));
    }

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::NotFound {
            entity_type: "Product",
            id: "42".to_string(),
        };
        assert_eq!(error.to_string(), "Product not found: 42");
    }

    #[test]
    fn test_repository_error_already_exists_display() {
        let error = RepositoryError::AlreadyExists {
            entity_type: "DiscountCode",
            id: "SAVE20".to_string(),
        };
        assert_eq!(error.to_string(), "DiscountCode already exists: SAVE20");
    }

    #[test]
    fn test_store_error_converts() {
        let error: RepositoryError = StoreError::new(ErrorKind::Internal, "boom").into();
        assert_eq!(error.to_string(), "Internal: boom");
    }
}
