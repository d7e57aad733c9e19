//! Path accessor for nested value trees
//!
//! Paths address locations inside a [`serde_json::Value`] tree using dots and
//! brackets: `user.addresses[0].city` and `user.addresses.0.city` are the same
//! location. Parsed segments are cached per path string.
//!
//! ## Examples
//!
//! ```
//! use reinhardt_form_core::path;
//! use serde_json::json;
//!
//! let mut tree = json!({});
//! path::set(&mut tree, "user.tags[1]", json!("rust"));
//! assert_eq!(tree, json!({"user": {"tags": [null, "rust"]}}));
//!
//! assert_eq!(path::get(&tree, "user.tags.1"), Some(&json!("rust")));
//! assert_eq!(path::get_or(&tree, "user.missing", json!("n/a")), json!("n/a"));
//!
//! path::unset(&mut tree, "user.tags.1");
//! assert_eq!(tree, json!({}));
//! ```

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

const CACHE_CAPACITY: usize = 4096;

static SEGMENT_CACHE: LazyLock<RwLock<HashMap<String, Arc<[String]>>>> =
	LazyLock::new(|| RwLock::new(HashMap::new()));

fn is_simple(path: &str) -> bool {
	path.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split(path: &str) -> Vec<String> {
	path.replace(['"', '\'', ']'], "")
		.split(['.', '['])
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

/// Parse a path into its segments
///
/// Identifier-only paths are a single segment; everything else is split on
/// `.` and `[`, dropping quotes and closing brackets.
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::path::segments;
///
/// assert_eq!(&*segments("name"), ["name"]);
/// assert_eq!(&*segments("a[0]['b'].c"), ["a", "0", "b", "c"]);
/// ```
pub fn segments(path: &str) -> Arc<[String]> {
	if let Some(cached) = SEGMENT_CACHE.read().get(path) {
		return Arc::clone(cached);
	}

	let parsed: Arc<[String]> = if is_simple(path) {
		if path.is_empty() {
			Arc::from(Vec::new())
		} else {
			Arc::from(vec![path.to_string()])
		}
	} else {
		Arc::from(split(path))
	};

	let mut cache = SEGMENT_CACHE.write();
	if cache.len() >= CACHE_CAPACITY {
		cache.clear();
	}
	cache.insert(path.to_string(), Arc::clone(&parsed));
	parsed
}

/// Canonical dotted form of a path
///
/// ```
/// use reinhardt_form_core::path::normalize;
///
/// assert_eq!(normalize("rows[2].label"), "rows.2.label");
/// ```
pub fn normalize(path: &str) -> String {
	segments(path).join(".")
}

/// Join a parent path and a child segment
pub fn join(parent: &str, child: &str) -> String {
	if parent.is_empty() {
		child.to_string()
	} else {
		format!("{parent}.{child}")
	}
}

fn as_index(segment: &str) -> Option<usize> {
	if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	segment.parse().ok()
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
	match node {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => as_index(segment).and_then(|i| items.get(i)),
		_ => None,
	}
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
	match node {
		Value::Object(map) => map.get_mut(segment),
		Value::Array(items) => as_index(segment).and_then(|i| items.get_mut(i)),
		_ => None,
	}
}

/// Value at `path`, or `None` when any segment is absent
///
/// An empty path addresses the whole tree.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
	segments(path)
		.iter()
		.try_fold(tree, |node, segment| child(node, segment))
}

/// Mutable value at `path`
pub fn get_mut<'a>(tree: &'a mut Value, path: &str) -> Option<&'a mut Value> {
	let segments = segments(path);
	let mut node = tree;
	for segment in segments.iter() {
		node = child_mut(node, segment)?;
	}
	Some(node)
}

/// Owned value at `path`, or `default` when absent
pub fn get_or(tree: &Value, path: &str, default: Value) -> Value {
	get(tree, path).cloned().unwrap_or(default)
}

fn empty_container_for(next: &str) -> Value {
	if as_index(next).is_some() {
		Value::Array(Vec::new())
	} else {
		Value::Object(Map::new())
	}
}

/// Most `null` padding a single write may add to a sequence
const MAX_PADDING: usize = 1 << 16;

/// Element `index` of `items`, padding with `null` up to it
///
/// Indices further than [`MAX_PADDING`] past the end are refused.
fn slot(items: &mut Vec<Value>, index: usize) -> Option<&mut Value> {
	if index >= items.len() {
		if index - items.len() > MAX_PADDING {
			tracing::warn!(index, len = items.len(), "sequence index out of reach, write ignored");
			return None;
		}
		items.resize(index + 1, Value::Null);
	}
	items.get_mut(index)
}

/// Write `value` at `path`, creating intermediate containers
///
/// A missing container becomes a sequence when the next segment is numeric and
/// a keyed map otherwise. Scalars in the way are replaced. A non-numeric
/// segment addressing into a sequence is ignored, as is an index far past
/// the end of one.
pub fn set(tree: &mut Value, path: &str, value: Value) {
	let segments = segments(path);
	let Some((last, parents)) = segments.split_last() else {
		*tree = value;
		return;
	};

	let mut node = tree;
	for (i, segment) in parents.iter().enumerate() {
		let next = &segments[i + 1];
		if !matches!(node, Value::Object(_) | Value::Array(_)) {
			*node = Value::Object(Map::new());
		}
		node = match node {
			Value::Object(map) => {
				let entry = map
					.entry(segment.clone())
					.or_insert_with(|| empty_container_for(next));
				if !matches!(entry, Value::Object(_) | Value::Array(_)) {
					*entry = empty_container_for(next);
				}
				entry
			}
			Value::Array(items) => {
				let Some(entry) = as_index(segment).and_then(|index| slot(items, index)) else {
					return;
				};
				if !matches!(entry, Value::Object(_) | Value::Array(_)) {
					*entry = empty_container_for(next);
				}
				entry
			}
			_ => return,
		};
	}

	if !matches!(node, Value::Object(_) | Value::Array(_)) {
		*node = Value::Object(Map::new());
	}
	match node {
		Value::Object(map) => {
			map.insert(last.clone(), value);
		}
		Value::Array(items) => {
			if let Some(entry) = as_index(last).and_then(|index| slot(items, index)) {
				*entry = value;
			}
		}
		_ => {}
	}
}

/// Whether a container holds no data
///
/// Empty maps and sequences made only of `null` holes are empty.
pub fn is_empty_container(value: &Value) -> bool {
	match value {
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items.iter().all(Value::is_null),
		_ => false,
	}
}

fn remove_child(node: &mut Value, segment: &str) -> bool {
	match node {
		Value::Object(map) => map.remove(segment).is_some(),
		Value::Array(items) => match as_index(segment) {
			Some(index) if index < items.len() => {
				if index + 1 == items.len() {
					items.pop();
				} else {
					items[index] = Value::Null;
				}
				true
			}
			_ => false,
		},
		_ => false,
	}
}

fn unset_in(node: &mut Value, segments: &[String]) -> bool {
	match segments {
		[] => false,
		[leaf] => remove_child(node, leaf),
		[head, rest @ ..] => {
			let Some(next) = child_mut(node, head) else {
				return false;
			};
			let removed = unset_in(next, rest);
			if removed && is_empty_container(next) {
				remove_child(node, head);
			}
			removed
		}
	}
}

/// Remove the value at `path` and prune ancestors left empty
///
/// Returns whether anything was removed. The root itself is never removed.
pub fn unset(tree: &mut Value, path: &str) -> bool {
	let segments = segments(path);
	unset_in(tree, &segments)
}

/// Parent field-array path of an indexed path
///
/// `items.3.name` has parent `items`; paths without a numeric segment have
/// none.
pub fn array_parent(path: &str) -> Option<String> {
	let segments = segments(path);
	let index = segments.iter().position(|s| as_index(s).is_some())?;
	(index > 0).then(|| segments[..index].join("."))
}

/// Row index addressed right after `prefix` in `path`
///
/// Returns the index and the remaining suffix (without a leading dot).
pub(crate) fn split_index<'a>(path: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
	let rest = path.strip_prefix(prefix)?.strip_prefix('.')?;
	let (index, suffix) = match rest.split_once('.') {
		Some((index, suffix)) => (index, suffix),
		None => (rest, ""),
	};
	Some((as_index(index)?, suffix))
}
