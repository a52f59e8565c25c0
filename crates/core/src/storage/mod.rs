mod error;
mod types;

pub use error::{ErrorKind, RepositoryError, Result, StoreError};
pub use types::{calculate_ttl, AuditRange, MAX_AUDIT_RANGE_DAYS};
