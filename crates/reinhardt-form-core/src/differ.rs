//! Dirty/touched differ
//!
//! Structural comparison between the current values and the defaults. Missing
//! entries and `null` compare equal, and strings that both parse as RFC 3339
//! timestamps compare by instant.

use chrono::DateTime;
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

fn same_instant(a: &str, b: &str) -> bool {
	match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
		(Ok(a), Ok(b)) => a == b,
		_ => false,
	}
}

/// Structural equality of two value trees
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::differ::deep_equal;
/// use serde_json::json;
///
/// assert!(deep_equal(&json!({"a": 1, "b": null}), &json!({"a": 1})));
/// assert!(deep_equal(
///     &json!("2024-01-01T10:00:00+02:00"),
///     &json!("2024-01-01T08:00:00Z"),
/// ));
/// assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Object(a), Value::Object(b)) => a
			.keys()
			.chain(b.keys())
			.all(|k| deep_equal(a.get(k).unwrap_or(&NULL), b.get(k).unwrap_or(&NULL))),
		(Value::Array(a), Value::Array(b)) => (0..a.len().max(b.len()))
			.all(|i| deep_equal(a.get(i).unwrap_or(&NULL), b.get(i).unwrap_or(&NULL))),
		(Value::String(a), Value::String(b)) => a == b || same_instant(a, b),
		(Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
		_ => a == b,
	}
}

/// Mark every non-null leaf of `data` as `true`
///
/// Containers without leaves are pruned.
pub fn mark_fields_dirty(data: &Value) -> Option<Value> {
	match data {
		Value::Object(map) => {
			let marked: Map<String, Value> = map
				.iter()
				.filter_map(|(k, v)| mark_fields_dirty(v).map(|m| (k.clone(), m)))
				.collect();
			(!marked.is_empty()).then_some(Value::Object(marked))
		}
		Value::Array(items) => {
			let marked: Vec<Value> = items
				.iter()
				.map(|v| mark_fields_dirty(v).unwrap_or(Value::Null))
				.collect();
			compact_array(marked)
		}
		Value::Null => None,
		_ => Some(Value::Bool(true)),
	}
}

fn compact_array(mut items: Vec<Value>) -> Option<Value> {
	while items.last().is_some_and(Value::is_null) {
		items.pop();
	}
	(!items.is_empty()).then_some(Value::Array(items))
}

fn marked_or_leaf(container: &Value, other: Option<&Value>) -> Option<Value> {
	mark_fields_dirty(container).or_else(|| {
		(!deep_equal(container, other.unwrap_or(&NULL))).then_some(Value::Bool(true))
	})
}

fn diff(value: Option<&Value>, default: Option<&Value>) -> Option<Value> {
	match (value, default) {
		(Some(Value::Object(v)), Some(Value::Object(d))) => {
			let mut out = Map::new();
			for key in v.keys().chain(d.keys().filter(|k| !v.contains_key(*k))) {
				if let Some(marked) = diff(v.get(key), d.get(key)) {
					out.insert(key.clone(), marked);
				}
			}
			(!out.is_empty()).then_some(Value::Object(out))
		}
		(Some(Value::Array(v)), Some(Value::Array(d))) => {
			let marked = (0..v.len().max(d.len()))
				.map(|i| diff(v.get(i), d.get(i)).unwrap_or(Value::Null))
				.collect();
			compact_array(marked)
		}
		(Some(container @ (Value::Object(_) | Value::Array(_))), other) => {
			marked_or_leaf(container, other)
		}
		(other, Some(container @ (Value::Object(_) | Value::Array(_)))) => {
			marked_or_leaf(container, other)
		}
		(value, default) => (!deep_equal(value.unwrap_or(&NULL), default.unwrap_or(&NULL)))
			.then_some(Value::Bool(true)),
	}
}

/// Build the pruned dirty map of `values` against `defaults`
///
/// The result is an object tree whose leaves are `true`; it is empty exactly
/// when [`deep_equal`] holds.
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::differ::dirty_fields;
/// use serde_json::json;
///
/// let defaults = json!({"name": "", "tags": ["a"], "address": {"city": "Oslo"}});
/// let values = json!({"name": "Ada", "tags": ["a", "b"], "address": {"city": "Oslo"}});
///
/// assert_eq!(
///     dirty_fields(&values, &defaults),
///     json!({"name": true, "tags": [null, true]}),
/// );
/// ```
pub fn dirty_fields(values: &Value, defaults: &Value) -> Value {
	match diff(Some(values), Some(defaults)) {
		Some(Value::Object(map)) => Value::Object(map),
		_ => Value::Object(Map::new()),
	}
}

/// Whether the whole tree differs from its defaults
pub fn is_dirty(values: &Value, defaults: &Value) -> bool {
	!deep_equal(values, defaults)
}

/// Whether a boolean mirror tree has any `true` leaf
pub fn has_marks(tree: &Value) -> bool {
	match tree {
		Value::Bool(b) => *b,
		Value::Object(map) => map.values().any(has_marks),
		Value::Array(items) => items.iter().any(has_marks),
		_ => false,
	}
}
