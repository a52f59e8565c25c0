//! Request/response shapes and pure expression helpers for the client.
//!
//! Everything here is synchronous and side-effect free, so the expression
//! assembly and sparse-index rules are testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

/// A raw DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

/// Read consistency level.
///
/// Defaults to eventually consistent, which halves the read cost. Call
/// sites that need read-your-writes guarantees (key lookups right after a
/// write, counter reads) opt into `Strong` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadConsistency {
    #[default]
    Eventual,
    Strong,
}

impl ReadConsistency {
    pub fn is_strong(&self) -> bool {
        matches!(self, ReadConsistency::Strong)
    }
}

/// A condition expression with its placeholder aliases.
#[derive(Debug, Clone, Default)]
pub struct Condition {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl Condition {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            names: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// `attribute_not_exists(PK)` - the creation precondition.
    pub fn item_absent() -> Self {
        Self::new("attribute_not_exists(PK)")
    }

    /// `attribute_exists(PK)` - the update precondition.
    pub fn item_exists() -> Self {
        Self::new("attribute_exists(PK)")
    }

    /// `attribute_exists(PK) AND attribute_not_exists(deleted_at)`.
    pub fn exists_and_not_deleted() -> Self {
        Self::new("attribute_exists(PK) AND attribute_not_exists(deleted_at)")
    }

    pub fn name(mut self, alias: impl Into<String>, attr: impl Into<String>) -> Self {
        self.names.insert(alias.into(), attr.into());
        self
    }

    pub fn value(mut self, alias: impl Into<String>, value: AttributeValue) -> Self {
        self.values.insert(alias.into(), value);
        self
    }

    /// Conjoins another clause onto this condition.
    pub fn and(mut self, clause: impl Into<String>) -> Self {
        self.expression = format!("({}) AND ({})", self.expression, clause.into());
        self
    }
}

/// A projection expression with its name aliases.
#[derive(Debug, Clone)]
pub struct Projection {
    pub expression: String,
    pub names: HashMap<String, String>,
}

/// Builds a projection expression aliasing every attribute name.
///
/// Aliases (`#p0`, `#p1`, ...) keep reserved words like `name` or `status`
/// safe to project.
pub fn build_projection(attributes: &[&str]) -> Projection {
    let mut names = HashMap::new();
    let mut parts = Vec::with_capacity(attributes.len());
    for (i, attr) in attributes.iter().enumerate() {
        let alias = format!("#p{i}");
        parts.push(alias.clone());
        names.insert(alias, (*attr).to_string());
    }
    Projection {
        expression: parts.join(", "),
        names,
    }
}

/// One sparse-index population rule.
///
/// When `applies` holds for the item, the rule's partition (and optional
/// sort) attributes are injected; otherwise they are left absent, keeping
/// the item invisible to that index.
pub struct SparseIndexRule<'a> {
    pub partition_attr: &'static str,
    pub sort_attr: Option<&'static str>,
    pub applies: &'a dyn Fn(&Item) -> bool,
    pub partition_value: &'a dyn Fn(&Item) -> String,
    pub sort_value: Option<&'a dyn Fn(&Item) -> String>,
}

/// Conditionally injects secondary-index key attributes.
pub fn add_sparse_index_attributes(item: &mut Item, rules: &[SparseIndexRule]) {
    for rule in rules {
        if !(rule.applies)(item) {
            continue;
        }
        let pk = (rule.partition_value)(item);
        item.insert(rule.partition_attr.to_string(), AttributeValue::S(pk));
        if let (Some(attr), Some(derive)) = (rule.sort_attr, rule.sort_value) {
            let sk = derive(item);
            item.insert(attr.to_string(), AttributeValue::S(sk));
        }
    }
}

/// A single logical query against the table or one of its indexes.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub index: Option<&'static str>,
    pub key_condition: String,
    pub values: HashMap<String, AttributeValue>,
    /// Filter applied server-side after the index lookup.
    pub filter: Option<String>,
    pub limit: Option<i32>,
    pub exclusive_start_key: Option<Item>,
    /// `false` returns newest-first for timestamp-sorted keys.
    pub scan_forward: bool,
    pub read: ReadConsistency,
}

impl QueryRequest {
    pub fn new(key_condition: impl Into<String>) -> Self {
        Self {
            index: None,
            key_condition: key_condition.into(),
            values: HashMap::new(),
            filter: None,
            limit: None,
            exclusive_start_key: None,
            scan_forward: true,
            read: ReadConsistency::Eventual,
        }
    }

    pub fn on_index(mut self, index: &'static str) -> Self {
        self.index = Some(index);
        self
    }

    pub fn value(mut self, alias: impl Into<String>, value: AttributeValue) -> Self {
        self.values.insert(alias.into(), value);
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_key(mut self, key: Option<Item>) -> Self {
        self.exclusive_start_key = key;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    pub fn strong(mut self) -> Self {
        self.read = ReadConsistency::Strong;
        self
    }
}

/// One page of query results.
///
/// `last_evaluated_key` is an opaque continuation token; echo it back
/// verbatim via [`QueryRequest::start_key`] to fetch the next page.
#[derive(Debug, Clone)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub last_evaluated_key: Option<Item>,
    pub count: usize,
}

impl<T> QueryPage<T> {
    /// Converts the page's items, keeping the pagination state.
    pub fn try_map<U, E>(self, f: impl Fn(&T) -> Result<U, E>) -> Result<QueryPage<U>, E> {
        let items = self.items.iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(QueryPage {
            count: items.len(),
            items,
            last_evaluated_key: self.last_evaluated_key,
        })
    }
}

/// One operation in a batch write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Upsert-style put of a full item.
    Put(Item),
    /// Delete by primary key.
    Delete { pk: String, sk: String },
}

/// Aggregate result of a (possibly chunked) batch get.
///
/// `unprocessed_keys` accumulates across chunks and is returned to the
/// caller rather than silently retried; the caller decides on resubmission.
#[derive(Debug, Clone, Default)]
pub struct BatchGetOutput {
    pub items: Vec<Item>,
    pub unprocessed_keys: Vec<Item>,
}

/// Aggregate result of a (possibly chunked) batch write.
#[derive(Debug, Clone, Default)]
pub struct BatchWriteOutput {
    pub unprocessed: Vec<WriteOp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_projection_aliases_every_attribute() {
        let projection = build_projection(&["id", "name", "status"]);
        assert_eq!(projection.expression, "#p0, #p1, #p2");
        assert_eq!(projection.names.get("#p0").unwrap(), "id");
        assert_eq!(projection.names.get("#p1").unwrap(), "name");
        assert_eq!(projection.names.get("#p2").unwrap(), "status");
    }

    #[test]
    fn test_build_projection_empty() {
        let projection = build_projection(&[]);
        assert_eq!(projection.expression, "");
        assert!(projection.names.is_empty());
    }

    #[test]
    fn test_condition_and() {
        let condition = Condition::item_exists().and("attribute_not_exists(deleted_at)");
        assert_eq!(
            condition.expression,
            "(attribute_exists(PK)) AND (attribute_not_exists(deleted_at))"
        );
    }

    #[test]
    fn test_sparse_rule_applies() {
        let mut item: Item = HashMap::new();
        item.insert("character_id".to_string(), AttributeValue::N("7".to_string()));
        item.insert("id".to_string(), AttributeValue::N("42".to_string()));

        let rules = [SparseIndexRule {
            partition_attr: "GSI3PK",
            sort_attr: Some("GSI3SK"),
            applies: &|item: &Item| item.contains_key("character_id"),
            partition_value: &|item: &Item| {
                format!("CHARACTER#{}", item["character_id"].as_n().unwrap())
            },
            sort_value: Some(&|item: &Item| {
                format!("PRODUCT#{}", item["id"].as_n().unwrap())
            }),
        }];

        add_sparse_index_attributes(&mut item, &rules);
        assert_eq!(item.get("GSI3PK").unwrap().as_s().unwrap(), "CHARACTER#7");
        assert_eq!(item.get("GSI3SK").unwrap().as_s().unwrap(), "PRODUCT#42");
    }

    #[test]
    fn test_sparse_rule_skipped_when_predicate_false() {
        let mut item: Item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::N("42".to_string()));

        let rules = [SparseIndexRule {
            partition_attr: "GSI3PK",
            sort_attr: None,
            applies: &|item: &Item| item.contains_key("character_id"),
            partition_value: &|_: &Item| unreachable!("predicate is false"),
            sort_value: None,
        }];

        add_sparse_index_attributes(&mut item, &rules);
        assert!(!item.contains_key("GSI3PK"));
        assert!(!item.contains_key("GSI3SK"));
    }

    #[test]
    fn test_query_request_builder() {
        let request = QueryRequest::new("PK = :pk")
            .on_index("GSI1")
            .value(":pk", AttributeValue::S("PRODUCT#1".to_string()))
            .filter("attribute_not_exists(deleted_at)")
            .limit(20)
            .newest_first();

        assert_eq!(request.index, Some("GSI1"));
        assert!(!request.scan_forward);
        assert_eq!(request.limit, Some(20));
        assert!(request.filter.is_some());
        assert_eq!(request.read, ReadConsistency::Eventual);
    }
}
