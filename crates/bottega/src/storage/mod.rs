//! Storage backend implementation.
//!
//! The single backend is DynamoDB; every access pattern in the repositories
//! maps onto one of the fixed primary-key or secondary-index lookups built
//! here. There is no ad-hoc query planning: if an access pattern needs a new
//! index, it gets one, and the codec in `dynamodb::conversions` keeps the
//! index projections consistent with their source attributes.

pub mod dynamodb;
