//! Single-table DynamoDB storage engine for the bottega shop.
//!
//! Every entity lives in one table keyed by a `PK`/`SK` pair of composite
//! strings, with up to three global secondary indexes for alternate lookups.
//! All reads and writes flow through [`storage::dynamodb::DynamoClient`],
//! which owns retrying, batch splitting, consumed-capacity accounting, and
//! error normalization; the repositories in [`repositories`] compose it with
//! the key and attribute codecs into entity-specific operations.

pub mod config;
pub mod repositories;
pub mod storage;
