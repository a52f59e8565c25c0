//! The single choke point for all reads and writes.
//!
//! Every repository operation goes through [`DynamoClient`], which owns the
//! retry/backoff policy, the 100-key / 25-op batch splits, consumed-capacity
//! accounting, and update/condition expression assembly. Unprocessed batch
//! items are accumulated and handed back to the caller; the client never
//! resubmits them on its own.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{
    AttributeValue, ConsumedCapacity, DeleteRequest, KeysAndAttributes, PutRequest,
    ReturnConsumedCapacity, ReturnValue, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use chrono::Utc;

use bottega_core::storage::{ErrorKind, StoreError};

use super::error::{
    map_batch_get_error, map_batch_write_error, map_delete_item_error, map_get_item_error,
    map_put_item_error, map_query_error, map_update_item_error,
};
use super::types::{
    BatchGetOutput, BatchWriteOutput, Condition, Item, Projection, QueryPage, QueryRequest,
    ReadConsistency, WriteOp,
};
use crate::config::StorageConfig;

/// Maximum keys per underlying BatchGetItem call.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Maximum operations per underlying BatchWriteItem call.
pub const MAX_BATCH_WRITE_OPS: usize = 25;

/// Backoff before retry `attempt` (zero-based): `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Synthesizes a `SET`/`REMOVE` update expression with placeholder aliases
/// for every attribute name and value, so reserved words and arbitrary
/// values are always safe.
fn build_update_expression(
    sets: &[(String, AttributeValue)],
    removes: &[String],
) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut clauses = Vec::new();

    if !sets.is_empty() {
        let parts: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, (attr, value))| {
                let name = format!("#u{i}");
                let placeholder = format!(":u{i}");
                names.insert(name.clone(), attr.clone());
                values.insert(placeholder.clone(), value.clone());
                format!("{name} = {placeholder}")
            })
            .collect();
        clauses.push(format!("SET {}", parts.join(", ")));
    }

    if !removes.is_empty() {
        let parts: Vec<String> = removes
            .iter()
            .enumerate()
            .map(|(i, attr)| {
                let name = format!("#r{i}");
                names.insert(name.clone(), attr.clone());
                name
            })
            .collect();
        clauses.push(format!("REMOVE {}", parts.join(", ")));
    }

    (clauses.join(" "), names, values)
}

/// Retried, capacity-tracked client wrapper over one DynamoDB table.
#[derive(Debug, Clone)]
pub struct DynamoClient {
    client: Client,
    config: StorageConfig,
}

impl DynamoClient {
    /// Creates a client wrapper from an existing SDK client.
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Creates a client from configuration, using the SDK default credential
    /// chain with the configured region/endpoint overrides applied.
    pub async fn from_config(config: StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(Client::from_conf(builder.build()), config)
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Runs `call`, retrying with exponential backoff on transient kinds
    /// only. Everything else propagates on the first failure.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.kind.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(self.config.base_retry_delay, attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        kind = ?error.kind,
                        "transient storage error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Observability only: never affects control flow.
    fn log_capacity(&self, operation: &'static str, capacity: Option<&ConsumedCapacity>) {
        if let Some(capacity) = capacity {
            tracing::debug!(
                operation,
                table = %self.config.table_name,
                read_units = capacity.read_capacity_units.unwrap_or_default(),
                write_units = capacity.write_capacity_units.unwrap_or_default(),
                total_units = capacity.capacity_units.unwrap_or_default(),
                "consumed capacity"
            );
        }
    }

    // ========================================================================
    // Single-item operations
    // ========================================================================

    /// Gets one item by primary key.
    pub async fn get(
        &self,
        pk: &str,
        sk: &str,
        read: ReadConsistency,
        projection: Option<&Projection>,
    ) -> Result<Option<Item>, StoreError> {
        let output = self
            .with_retry("GetItem", || async {
                let mut request = self
                    .client
                    .get_item()
                    .table_name(&self.config.table_name)
                    .key("PK", AttributeValue::S(pk.to_string()))
                    .key("SK", AttributeValue::S(sk.to_string()))
                    .consistent_read(read.is_strong())
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                if let Some(projection) = projection {
                    request = request.projection_expression(&projection.expression);
                    for (alias, attr) in &projection.names {
                        request = request.expression_attribute_names(alias, attr);
                    }
                }
                request.send().await.map_err(map_get_item_error)
            })
            .await?;
        self.log_capacity("GetItem", output.consumed_capacity.as_ref());
        Ok(output.item)
    }

    /// Puts a full item, optionally guarded by a condition expression.
    pub async fn put(&self, item: Item, condition: Option<&Condition>) -> Result<(), StoreError> {
        let output = self
            .with_retry("PutItem", || async {
                let mut request = self
                    .client
                    .put_item()
                    .table_name(&self.config.table_name)
                    .set_item(Some(item.clone()))
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                if let Some(condition) = condition {
                    request = request.condition_expression(&condition.expression);
                    for (alias, attr) in &condition.names {
                        request = request.expression_attribute_names(alias, attr);
                    }
                    for (alias, value) in &condition.values {
                        request = request.expression_attribute_values(alias, value.clone());
                    }
                }
                request.send().await.map_err(map_put_item_error)
            })
            .await?;
        self.log_capacity("PutItem", output.consumed_capacity.as_ref());
        Ok(())
    }

    /// Applies a partial update (`SET` pairs plus `REMOVE` attributes) and
    /// returns the full item as it stands after the write.
    ///
    /// A failed condition surfaces as `ErrorKind::ConditionFailed`;
    /// repositories translate that into their not-found / conflict result.
    pub async fn update(
        &self,
        pk: &str,
        sk: &str,
        sets: Vec<(String, AttributeValue)>,
        removes: &[String],
        condition: Option<&Condition>,
    ) -> Result<Item, StoreError> {
        let (expression, mut names, mut values) = build_update_expression(&sets, removes);
        if let Some(condition) = condition {
            names.extend(condition.names.clone());
            values.extend(condition.values.clone());
        }
        let output = self
            .with_retry("UpdateItem", || async {
                let mut request = self
                    .client
                    .update_item()
                    .table_name(&self.config.table_name)
                    .key("PK", AttributeValue::S(pk.to_string()))
                    .key("SK", AttributeValue::S(sk.to_string()))
                    .update_expression(&expression)
                    .return_values(ReturnValue::AllNew)
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                if let Some(condition) = condition {
                    request = request.condition_expression(&condition.expression);
                }
                for (alias, attr) in &names {
                    request = request.expression_attribute_names(alias, attr);
                }
                for (alias, value) in &values {
                    request = request.expression_attribute_values(alias, value.clone());
                }
                request.send().await.map_err(map_update_item_error)
            })
            .await?;
        self.log_capacity("UpdateItem", output.consumed_capacity.as_ref());
        output.attributes.ok_or_else(|| {
            StoreError::new(ErrorKind::Other, "UpdateItem returned no attributes")
        })
    }

    /// Applies a caller-supplied update expression with explicit value
    /// placeholders, for arithmetic updates the `SET`-pair form cannot
    /// express. The condition expression may reference the same
    /// placeholders.
    pub async fn update_with_expression(
        &self,
        pk: &str,
        sk: &str,
        expression: &str,
        values: Vec<(String, AttributeValue)>,
        condition: Option<&Condition>,
    ) -> Result<Item, StoreError> {
        let output = self
            .with_retry("UpdateItem", || async {
                let mut request = self
                    .client
                    .update_item()
                    .table_name(&self.config.table_name)
                    .key("PK", AttributeValue::S(pk.to_string()))
                    .key("SK", AttributeValue::S(sk.to_string()))
                    .update_expression(expression)
                    .return_values(ReturnValue::AllNew)
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                for (placeholder, value) in &values {
                    request = request.expression_attribute_values(placeholder, value.clone());
                }
                if let Some(condition) = condition {
                    request = request.condition_expression(&condition.expression);
                    for (alias, attr) in &condition.names {
                        request = request.expression_attribute_names(alias, attr);
                    }
                    for (alias, value) in &condition.values {
                        request = request.expression_attribute_values(alias, value.clone());
                    }
                }
                request.send().await.map_err(map_update_item_error)
            })
            .await?;
        self.log_capacity("UpdateItem", output.consumed_capacity.as_ref());
        output.attributes.ok_or_else(|| {
            StoreError::new(ErrorKind::Other, "UpdateItem returned no attributes")
        })
    }

    /// Hard-deletes an item by primary key.
    pub async fn delete(
        &self,
        pk: &str,
        sk: &str,
        condition: Option<&Condition>,
    ) -> Result<(), StoreError> {
        let output = self
            .with_retry("DeleteItem", || async {
                let mut request = self
                    .client
                    .delete_item()
                    .table_name(&self.config.table_name)
                    .key("PK", AttributeValue::S(pk.to_string()))
                    .key("SK", AttributeValue::S(sk.to_string()))
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                if let Some(condition) = condition {
                    request = request.condition_expression(&condition.expression);
                    for (alias, attr) in &condition.names {
                        request = request.expression_attribute_names(alias, attr);
                    }
                    for (alias, value) in &condition.values {
                        request = request.expression_attribute_values(alias, value.clone());
                    }
                }
                request.send().await.map_err(map_delete_item_error)
            })
            .await?;
        self.log_capacity("DeleteItem", output.consumed_capacity.as_ref());
        Ok(())
    }

    /// Marks an item soft-deleted without touching other fields.
    ///
    /// The item stays addressable by direct key; default listings exclude it
    /// by filtering on `deleted_at` absence.
    pub async fn soft_delete(
        &self,
        pk: &str,
        sk: &str,
        actor: Option<&str>,
    ) -> Result<Item, StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut sets = vec![
            ("deleted_at".to_string(), AttributeValue::S(now.clone())),
            ("updated_at".to_string(), AttributeValue::S(now)),
        ];
        if let Some(actor) = actor {
            sets.push(("deleted_by".to_string(), AttributeValue::S(actor.to_string())));
        }
        self.update(pk, sk, sets, &[], Some(&Condition::exists_and_not_deleted()))
            .await
    }

    /// Atomically increments a numeric attribute, defaulting it to zero when
    /// absent, and returns the post-increment value.
    ///
    /// The store serializes increments within a partition, so concurrent
    /// callers never observe duplicates.
    pub async fn increment(
        &self,
        pk: &str,
        sk: &str,
        attr: &str,
        by: i64,
    ) -> Result<i64, StoreError> {
        let output = self
            .with_retry("UpdateItem", || async {
                self.client
                    .update_item()
                    .table_name(&self.config.table_name)
                    .key("PK", AttributeValue::S(pk.to_string()))
                    .key("SK", AttributeValue::S(sk.to_string()))
                    .update_expression("SET #v = if_not_exists(#v, :zero) + :by")
                    .expression_attribute_names("#v", attr)
                    .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
                    .expression_attribute_values(":by", AttributeValue::N(by.to_string()))
                    .return_values(ReturnValue::AllNew)
                    .return_consumed_capacity(ReturnConsumedCapacity::Total)
                    .send()
                    .await
                    .map_err(map_update_item_error)
            })
            .await?;
        self.log_capacity("UpdateItem", output.consumed_capacity.as_ref());
        output
            .attributes
            .as_ref()
            .and_then(|attrs| attrs.get(attr))
            .and_then(|value| value.as_n().ok())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                StoreError::new(ErrorKind::Other, "incremented value missing from response")
            })
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Runs one server-side-paginated query against the table or an index.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryPage<Item>, StoreError> {
        let output = self
            .with_retry("Query", || async {
                let mut builder = self
                    .client
                    .query()
                    .table_name(&self.config.table_name)
                    .key_condition_expression(&request.key_condition)
                    .scan_index_forward(request.scan_forward)
                    .consistent_read(request.read.is_strong())
                    .return_consumed_capacity(ReturnConsumedCapacity::Total);
                if let Some(index) = request.index {
                    builder = builder.index_name(index);
                }
                if let Some(filter) = &request.filter {
                    builder = builder.filter_expression(filter);
                }
                if let Some(limit) = request.limit {
                    builder = builder.limit(limit);
                }
                if let Some(start_key) = &request.exclusive_start_key {
                    builder = builder.set_exclusive_start_key(Some(start_key.clone()));
                }
                for (alias, value) in &request.values {
                    builder = builder.expression_attribute_values(alias, value.clone());
                }
                builder.send().await.map_err(map_query_error)
            })
            .await?;
        self.log_capacity("Query", output.consumed_capacity.as_ref());
        let items = output.items.unwrap_or_default();
        Ok(QueryPage {
            count: items.len(),
            items,
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    // ========================================================================
    // Batch operations
    // ========================================================================

    /// Batch-gets an arbitrary number of keys, splitting into chunks of at
    /// most 100 and issuing the chunks sequentially.
    pub async fn batch_get(
        &self,
        keys: Vec<Item>,
        read: ReadConsistency,
    ) -> Result<BatchGetOutput, StoreError> {
        let mut result = BatchGetOutput::default();
        let mut total_units = 0.0_f64;
        for chunk in keys.chunks(MAX_BATCH_GET_KEYS) {
            let output = self
                .with_retry("BatchGetItem", || async {
                    let mut builder = KeysAndAttributes::builder().consistent_read(read.is_strong());
                    for key in chunk {
                        builder = builder.keys(key.clone());
                    }
                    let keys_and_attributes = builder.build().map_err(|e| {
                        StoreError::new(ErrorKind::Validation, e.to_string())
                    })?;
                    self.client
                        .batch_get_item()
                        .request_items(&self.config.table_name, keys_and_attributes)
                        .return_consumed_capacity(ReturnConsumedCapacity::Total)
                        .send()
                        .await
                        .map_err(map_batch_get_error)
                })
                .await?;
            if let Some(mut responses) = output.responses {
                if let Some(items) = responses.remove(&self.config.table_name) {
                    result.items.extend(items);
                }
            }
            if let Some(mut unprocessed) = output.unprocessed_keys {
                if let Some(keys_and_attributes) = unprocessed.remove(&self.config.table_name) {
                    result.unprocessed_keys.extend(keys_and_attributes.keys);
                }
            }
            if let Some(capacities) = output.consumed_capacity {
                total_units += capacities
                    .iter()
                    .filter_map(|c| c.capacity_units)
                    .sum::<f64>();
            }
        }
        tracing::debug!(
            operation = "BatchGetItem",
            table = %self.config.table_name,
            requested = keys.len(),
            returned = result.items.len(),
            unprocessed = result.unprocessed_keys.len(),
            total_units,
            "batch get complete"
        );
        Ok(result)
    }

    /// Batch-writes an arbitrary number of put/delete operations, splitting
    /// into chunks of at most 25 and issuing the chunks sequentially.
    pub async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<BatchWriteOutput, StoreError> {
        let mut result = BatchWriteOutput::default();
        let mut total_units = 0.0_f64;
        for chunk in ops.chunks(MAX_BATCH_WRITE_OPS) {
            let requests = chunk
                .iter()
                .map(write_op_to_request)
                .collect::<Result<Vec<_>, _>>()?;
            let output = self
                .with_retry("BatchWriteItem", || async {
                    self.client
                        .batch_write_item()
                        .request_items(&self.config.table_name, requests.clone())
                        .return_consumed_capacity(ReturnConsumedCapacity::Total)
                        .send()
                        .await
                        .map_err(map_batch_write_error)
                })
                .await?;
            if let Some(mut unprocessed) = output.unprocessed_items {
                if let Some(requests) = unprocessed.remove(&self.config.table_name) {
                    result
                        .unprocessed
                        .extend(requests.into_iter().filter_map(request_to_write_op));
                }
            }
            if let Some(capacities) = output.consumed_capacity {
                total_units += capacities
                    .iter()
                    .filter_map(|c| c.capacity_units)
                    .sum::<f64>();
            }
        }
        tracing::debug!(
            operation = "BatchWriteItem",
            table = %self.config.table_name,
            requested = ops.len(),
            unprocessed = result.unprocessed.len(),
            total_units,
            "batch write complete"
        );
        Ok(result)
    }
}

fn write_op_to_request(op: &WriteOp) -> Result<WriteRequest, StoreError> {
    let builder = WriteRequest::builder();
    let request = match op {
        WriteOp::Put(item) => builder.put_request(
            PutRequest::builder()
                .set_item(Some(item.clone()))
                .build()
                .map_err(|e| StoreError::new(ErrorKind::Validation, e.to_string()))?,
        ),
        WriteOp::Delete { pk, sk } => builder.delete_request(
            DeleteRequest::builder()
                .key("PK", AttributeValue::S(pk.clone()))
                .key("SK", AttributeValue::S(sk.clone()))
                .build()
                .map_err(|e| StoreError::new(ErrorKind::Validation, e.to_string()))?,
        ),
    };
    Ok(request.build())
}

fn request_to_write_op(request: WriteRequest) -> Option<WriteOp> {
    if let Some(put) = request.put_request {
        return Some(WriteOp::Put(put.item));
    }
    if let Some(delete) = request.delete_request {
        let pk = delete.key.get("PK")?.as_s().ok()?.clone();
        let sk = delete.key.get("SK")?.as_s().ok()?.clone();
        return Some(WriteOp::Delete { pk, sk });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use aws_sdk_dynamodb::config::BehaviorVersion;

    // No request ever leaves this client; it only exists so the retry loop
    // has a config to read.
    fn offline_client() -> DynamoClient {
        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let mut config = StorageConfig::new("bottega-test");
        config.base_retry_delay = Duration::from_millis(1);
        DynamoClient::new(Client::from_conf(conf), config)
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let client = offline_client();
        let attempts = Cell::new(0u32);
        let result = client
            .with_retry("Test", || {
                let n = attempts.get();
                attempts.set(n + 1);
                async move {
                    if n < 2 {
                        Err(StoreError::new(ErrorKind::Throttled, "slow down"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_makes_one_attempt_for_non_retryable() {
        let client = offline_client();
        let attempts = Cell::new(0u32);
        let result: Result<(), StoreError> = client
            .with_retry("Test", || {
                attempts.set(attempts.get() + 1);
                async { Err(StoreError::new(ErrorKind::Validation, "bad input")) }
            })
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let client = offline_client();
        let attempts = Cell::new(0u32);
        let result: Result<(), StoreError> = client
            .with_retry("Test", || {
                attempts.set(attempts.get() + 1);
                async { Err(StoreError::new(ErrorKind::Throttled, "still throttled")) }
            })
            .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Throttled);
        // Initial attempt plus the configured three retries.
        assert_eq!(attempts.get(), 4);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(400));
    }

    #[test]
    fn test_batch_get_chunk_count() {
        // 250 keys split into ceil(250/100) = 3 underlying calls.
        let keys: Vec<Item> = (0..250).map(|_| Item::new()).collect();
        assert_eq!(keys.chunks(MAX_BATCH_GET_KEYS).count(), 3);
        let exact: Vec<Item> = (0..200).map(|_| Item::new()).collect();
        assert_eq!(exact.chunks(MAX_BATCH_GET_KEYS).count(), 2);
    }

    #[test]
    fn test_batch_write_chunk_count() {
        // 60 ops split into ceil(60/25) = 3 underlying calls.
        let ops: Vec<u8> = vec![0; 60];
        assert_eq!(ops.chunks(MAX_BATCH_WRITE_OPS).count(), 3);
    }

    #[test]
    fn test_batch_chunks_preserve_order_and_cover_all() {
        let keys: Vec<usize> = (0..237).collect();
        let rejoined: Vec<usize> = keys
            .chunks(MAX_BATCH_GET_KEYS)
            .flatten()
            .copied()
            .collect();
        assert_eq!(rejoined, keys);
    }

    #[test]
    fn test_build_update_expression_sets_only() {
        let sets = vec![
            ("name".to_string(), AttributeValue::S("Mug".to_string())),
            ("stock".to_string(), AttributeValue::N("3".to_string())),
        ];
        let (expression, names, values) = build_update_expression(&sets, &[]);
        assert_eq!(expression, "SET #u0 = :u0, #u1 = :u1");
        assert_eq!(names.get("#u0").unwrap(), "name");
        assert_eq!(names.get("#u1").unwrap(), "stock");
        assert_eq!(values.get(":u1").unwrap().as_n().unwrap(), "3");
    }

    #[test]
    fn test_build_update_expression_with_removes() {
        let sets = vec![(
            "updated_at".to_string(),
            AttributeValue::S("2024-01-01T00:00:00Z".to_string()),
        )];
        let removes = vec!["deleted_at".to_string(), "deleted_by".to_string()];
        let (expression, names, _) = build_update_expression(&sets, &removes);
        assert_eq!(expression, "SET #u0 = :u0 REMOVE #r0, #r1");
        assert_eq!(names.get("#r0").unwrap(), "deleted_at");
        assert_eq!(names.get("#r1").unwrap(), "deleted_by");
    }

    #[test]
    fn test_write_op_round_trip() {
        let op = WriteOp::Delete {
            pk: "PRODUCT#1".to_string(),
            sk: "METADATA".to_string(),
        };
        let request = write_op_to_request(&op).unwrap();
        match request_to_write_op(request).unwrap() {
            WriteOp::Delete { pk, sk } => {
                assert_eq!(pk, "PRODUCT#1");
                assert_eq!(sk, "METADATA");
            }
            WriteOp::Put(_) => panic!("expected delete"),
        }
    }
}
