//! SDK error normalization.
//!
//! Maps AWS SDK errors into the closed [`ErrorKind`] taxonomy from
//! `bottega_core::storage`. This is the only place raw SDK error shapes are
//! inspected; everything above the client sees `StoreError` and matches on
//! its kind exhaustively.

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use bottega_core::storage::{ErrorKind, StoreError};

/// Classifies error codes the operation enums do not model as variants.
fn classify_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some("ThrottlingException") => ErrorKind::Throttled,
        Some("AccessDeniedException") | Some("UnrecognizedClientException") => {
            ErrorKind::AccessDenied
        }
        Some("ValidationException") => ErrorKind::Validation,
        Some("ServiceUnavailable") | Some("ServiceUnavailableException") => {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::Other,
    }
}

fn normalize(kind: ErrorKind, message: String, status: Option<u16>) -> StoreError {
    let mut error = StoreError::new(kind, message);
    if let Some(status) = status {
        error = error.with_status(status);
    }
    error
}

macro_rules! map_sdk_error {
    ($fn_name:ident, $error_ty:ident, $op:literal, {$($variant:ident => $kind:expr),* $(,)?}) => {
        #[doc = concat!("Map a ", $op, " SDK error to StoreError.")]
        pub fn $fn_name(err: SdkError<$error_ty>) -> StoreError {
            // Transport-level failures never reached the service; treat them
            // as transient.
            if matches!(err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)) {
                return StoreError::new(
                    ErrorKind::ServiceUnavailable,
                    format!(concat!($op, " transport failure: {}"), err),
                );
            }
            let status = err.raw_response().map(|r| r.status().as_u16());
            let service = err.into_service_error();
            let kind = match &service {
                $($error_ty::$variant(_) => $kind,)*
                other => classify_code(other.code()),
            };
            let message = service
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| format!(concat!($op, " failed: {:?}"), service));
            normalize(kind, message, status)
        }
    };
}

map_sdk_error!(map_get_item_error, GetItemError, "GetItem", {
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
});

map_sdk_error!(map_query_error, QueryError, "Query", {
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
});

map_sdk_error!(map_put_item_error, PutItemError, "PutItem", {
    ConditionalCheckFailedException => ErrorKind::ConditionFailed,
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
    TransactionConflictException => ErrorKind::Internal,
    ItemCollectionSizeLimitExceededException => ErrorKind::Validation,
});

map_sdk_error!(map_update_item_error, UpdateItemError, "UpdateItem", {
    ConditionalCheckFailedException => ErrorKind::ConditionFailed,
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
    TransactionConflictException => ErrorKind::Internal,
    ItemCollectionSizeLimitExceededException => ErrorKind::Validation,
});

map_sdk_error!(map_delete_item_error, DeleteItemError, "DeleteItem", {
    ConditionalCheckFailedException => ErrorKind::ConditionFailed,
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
    TransactionConflictException => ErrorKind::Internal,
    ItemCollectionSizeLimitExceededException => ErrorKind::Validation,
});

map_sdk_error!(map_batch_get_error, BatchGetItemError, "BatchGetItem", {
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
});

map_sdk_error!(map_batch_write_error, BatchWriteItemError, "BatchWriteItem", {
    ProvisionedThroughputExceededException => ErrorKind::CapacityExceeded,
    RequestLimitExceeded => ErrorKind::Throttled,
    InternalServerError => ErrorKind::Internal,
    ResourceNotFoundException => ErrorKind::ResourceNotFound,
    ItemCollectionSizeLimitExceededException => ErrorKind::Validation,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unmodeled_codes() {
        assert_eq!(
            classify_code(Some("ThrottlingException")),
            ErrorKind::Throttled
        );
        assert_eq!(
            classify_code(Some("AccessDeniedException")),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            classify_code(Some("ValidationException")),
            ErrorKind::Validation
        );
        assert_eq!(
            classify_code(Some("ServiceUnavailableException")),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(classify_code(Some("SomethingElse")), ErrorKind::Other);
        assert_eq!(classify_code(None), ErrorKind::Other);
    }

    #[test]
    fn test_normalize_carries_status() {
        let error = normalize(ErrorKind::Throttled, "slow down".to_string(), Some(400));
        assert_eq!(error.kind, ErrorKind::Throttled);
        assert_eq!(error.http_status, Some(400));
    }

    #[test]
    fn test_transport_failure_maps_to_service_unavailable() {
        let error = map_get_item_error(SdkError::timeout_error("deadline exceeded"));
        assert_eq!(error.kind, ErrorKind::ServiceUnavailable);
        assert!(error.kind.is_retryable());
    }
}
