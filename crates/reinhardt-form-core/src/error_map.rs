//! Rule-failure records keyed by path

use crate::handle::HandleRef;
use crate::path;
use reinhardt_form_signals::is_path_prefix;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Which rule failed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorType {
	Required,
	Min,
	Max,
	MinLength,
	MaxLength,
	Pattern,
	Validate,
	/// Named predicate, resolver-provided type, or a type passed to `set_error`
	Custom(String),
}

impl ErrorType {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Required => "required",
			Self::Min => "min",
			Self::Max => "max",
			Self::MinLength => "minLength",
			Self::MaxLength => "maxLength",
			Self::Pattern => "pattern",
			Self::Validate => "validate",
			Self::Custom(name) => name,
		}
	}
}

impl From<&str> for ErrorType {
	fn from(name: &str) -> Self {
		match name {
			"required" => Self::Required,
			"min" => Self::Min,
			"max" => Self::Max,
			"minLength" => Self::MinLength,
			"maxLength" => Self::MaxLength,
			"pattern" => Self::Pattern,
			"validate" => Self::Validate,
			other => Self::Custom(other.to_string()),
		}
	}
}

impl fmt::Display for ErrorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for ErrorType {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

/// One field's failure
///
/// `types` is filled only when every failing rule is collected; an empty
/// message there stands for a failure without text.
#[derive(Clone, Serialize)]
pub struct FieldError {
	#[serde(rename = "type")]
	pub error_type: ErrorType,
	pub message: String,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub types: BTreeMap<String, String>,
	#[serde(skip)]
	pub(crate) handle: Option<HandleRef>,
}

impl FieldError {
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_core::{ErrorType, FieldError};
	///
	/// let error = FieldError::new("server", "Username already taken");
	/// assert_eq!(error.error_type, ErrorType::Custom("server".into()));
	///
	/// let required = FieldError::new(ErrorType::Required, "");
	/// assert_eq!(required.error_type.as_str(), "required");
	/// ```
	pub fn new(error_type: impl Into<ErrorType>, message: impl Into<String>) -> Self {
		Self {
			error_type: error_type.into(),
			message: message.into(),
			types: BTreeMap::new(),
			handle: None,
		}
	}

	pub fn with_types<I, K, V>(mut self, types: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.types = types
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		self
	}

	/// Handle of the input that failed, when one is attached
	pub fn handle(&self) -> Option<&HandleRef> {
		self.handle.as_ref()
	}

	pub(crate) fn with_handle(mut self, handle: Option<HandleRef>) -> Self {
		self.handle = handle;
		self
	}
}

impl From<ErrorType> for FieldError {
	fn from(error_type: ErrorType) -> Self {
		Self::new(error_type, "")
	}
}

impl PartialEq for FieldError {
	fn eq(&self, other: &Self) -> bool {
		self.error_type == other.error_type
			&& self.message == other.message
			&& self.types == other.types
	}
}

impl fmt::Debug for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldError")
			.field("error_type", &self.error_type)
			.field("message", &self.message)
			.field("types", &self.types)
			.field("has_handle", &self.handle.is_some())
			.finish()
	}
}

/// Path to failure mapping
///
/// Keys are canonical dotted paths. A field-array root reports its own
/// failure under `<array>.root`; the form-level slot is `root`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, FieldError>);

impl ErrorMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&FieldError> {
		self.0.get(&path::normalize(name))
	}

	pub fn insert(&mut self, name: &str, error: FieldError) -> Option<FieldError> {
		self.0.insert(path::normalize(name), error)
	}

	/// Remove the entry at exactly `name`
	pub fn remove(&mut self, name: &str) -> Option<FieldError> {
		self.0.remove(&path::normalize(name))
	}

	/// Remove `name` and every entry below it; returns whether anything went
	pub fn remove_tree(&mut self, name: &str) -> bool {
		let name = path::normalize(name);
		let before = self.0.len();
		self.0.retain(|key, _| !is_path_prefix(&name, key));
		before != self.0.len()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(&path::normalize(name))
	}

	/// Whether `name` or anything below it has an error
	pub fn has_errors_under(&self, name: &str) -> bool {
		let name = path::normalize(name);
		self.0.keys().any(|key| is_path_prefix(&name, key))
	}

	/// Entries at or below `name`
	pub fn slice(&self, name: &str) -> ErrorMap {
		let name = path::normalize(name);
		self.0
			.iter()
			.filter(|(key, _)| is_path_prefix(&name, key))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Replace everything at or below `name` with `slice`
	pub fn merge_slice(&mut self, name: &str, slice: ErrorMap) {
		self.remove_tree(name);
		self.0.extend(slice.0);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Move row entries of a field array through an index mapping
	///
	/// Rows mapped to `None` lose their entries. `<array>.root` is untouched.
	pub(crate) fn remap_rows(&mut self, array: &str, map: impl Fn(usize) -> Option<usize>) {
		let rows: Vec<(usize, String)> = self
			.0
			.keys()
			.filter_map(|key| {
				path::split_index(key, array).map(|(index, rest)| (index, rest.to_string()))
			})
			.collect();
		let mut moved = Vec::with_capacity(rows.len());
		for (index, rest) in rows {
			let key = row_key(array, index, &rest);
			if let Some(error) = self.0.remove(&key) {
				if let Some(target) = map(index) {
					moved.push((row_key(array, target, &rest), error));
				}
			}
		}
		self.0.extend(moved);
	}
}

fn row_key(array: &str, index: usize, rest: &str) -> String {
	if rest.is_empty() {
		format!("{array}.{index}")
	} else {
		format!("{array}.{index}.{rest}")
	}
}

impl FromIterator<(String, FieldError)> for ErrorMap {
	fn from_iter<I: IntoIterator<Item = (String, FieldError)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (path::normalize(&k), v))
				.collect(),
		)
	}
}

impl<'a> IntoIterator for &'a ErrorMap {
	type Item = (&'a String, &'a FieldError);
	type IntoIter = std::collections::btree_map::Iter<'a, String, FieldError>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
