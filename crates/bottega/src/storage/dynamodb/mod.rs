//! DynamoDB storage engine.
//!
//! Layout follows the usual split: `types` holds the request/response
//! shapes and pure expression helpers, `keys` the composite-key codec,
//! `conversions` the attribute codec, `error` the SDK error normalization,
//! `client` the retried client wrapper, and `counter` the atomic sequence
//! allocator built on top of it.

mod client;
mod conversions;
mod counter;
mod error;
pub mod keys;
mod types;

pub use client::{backoff_delay, DynamoClient, MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_OPS};
pub use conversions::*;
pub use counter::{
    format_order_number, SequenceAllocator, COUNTER_DISCOUNT_ID, COUNTER_ORDER_NUMBER,
    COUNTER_PERSONAGGIO_ID, COUNTER_PRODUCT_ID,
};
pub use types::{
    add_sparse_index_attributes, build_projection, BatchGetOutput, BatchWriteOutput, Condition,
    Item, Projection, QueryPage, QueryRequest, ReadConsistency, SparseIndexRule, WriteOp,
};
