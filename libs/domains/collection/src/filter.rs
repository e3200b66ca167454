//! Builders for `where` / `where_document` predicates.
//!
//! The operator grammar (`$eq`, `$contains`, `$and`, ...) belongs to the store;
//! these helpers only assemble the JSON so callers don't hand-write it. Filters
//! are passed as `Option<Filter>`: `None` means "no predicate", which is not the
//! same as an empty object.

use serde_json::{Map, Value};

use crate::models::MetadataValue;

/// A predicate object in the store's filter grammar
pub type Filter = Map<String, Value>;

fn single(key: impl Into<String>, value: Value) -> Filter {
    let mut filter = Map::new();
    filter.insert(key.into(), value);
    filter
}

fn scalar(value: impl Into<MetadataValue>) -> Value {
    let value: MetadataValue = value.into();
    value.into()
}

fn operator(key: &str, op: &str, value: impl Into<MetadataValue>) -> Filter {
    single(key, Value::Object(single(op, scalar(value))))
}

/// Metadata field equals `value` (shorthand form)
pub fn eq(key: &str, value: impl Into<MetadataValue>) -> Filter {
    single(key, scalar(value))
}

pub fn ne(key: &str, value: impl Into<MetadataValue>) -> Filter {
    operator(key, "$ne", value)
}

pub fn gt(key: &str, value: impl Into<MetadataValue>) -> Filter {
    operator(key, "$gt", value)
}

pub fn gte(key: &str, value: impl Into<MetadataValue>) -> Filter {
    operator(key, "$gte", value)
}

pub fn lt(key: &str, value: impl Into<MetadataValue>) -> Filter {
    operator(key, "$lt", value)
}

pub fn lte(key: &str, value: impl Into<MetadataValue>) -> Filter {
    operator(key, "$lte", value)
}

/// Metadata field is one of `values`
pub fn is_in<V: Into<MetadataValue>>(key: &str, values: impl IntoIterator<Item = V>) -> Filter {
    let values = values.into_iter().map(scalar).collect::<Vec<_>>();
    single(key, Value::Object(single("$in", Value::Array(values))))
}

/// Document content contains `text` (for `where_document`)
pub fn contains(text: impl Into<String>) -> Filter {
    single("$contains", Value::String(text.into()))
}

/// Document content does not contain `text` (for `where_document`)
pub fn not_contains(text: impl Into<String>) -> Filter {
    single("$not_contains", Value::String(text.into()))
}

/// All predicates must hold
pub fn and(filters: impl IntoIterator<Item = Filter>) -> Filter {
    combine("$and", filters)
}

/// Any predicate may hold
pub fn or(filters: impl IntoIterator<Item = Filter>) -> Filter {
    combine("$or", filters)
}

fn combine(op: &str, filters: impl IntoIterator<Item = Filter>) -> Filter {
    let clauses = filters.into_iter().map(Value::Object).collect();
    single(op, Value::Array(clauses))
}
