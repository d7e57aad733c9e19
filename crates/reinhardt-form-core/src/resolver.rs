//! External whole-form validation
//!
//! A resolver replaces per-field rules for the whole form. It receives the
//! current values, the opaque context and the descriptors of the requested
//! fields, and returns coerced values plus a complete [`ErrorMap`] for that
//! scope.
//!
//! ```
//! use reinhardt_form_core::{ErrorMap, FieldError, ResolverOutput, resolver_fn};
//!
//! let resolver = resolver_fn(|values, _context, _options| {
//!     let mut errors = ErrorMap::new();
//!     if values["email"].as_str().is_none_or(|email| !email.contains('@')) {
//!         errors.insert("email", FieldError::new("email", "Invalid email"));
//!     }
//!     Ok(ResolverOutput { values, errors })
//! });
//! # let _ = resolver;
//! ```

use crate::error_map::ErrorMap;
use crate::mode::CriteriaMode;
use crate::registry::FieldDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// Scope and metadata handed to a resolver
#[derive(Debug, Clone)]
pub struct ResolverOptions {
	pub criteria_mode: CriteriaMode,
	/// Paths the caller asked about; every mounted path on submit
	pub names: Vec<String>,
	/// Descriptors of the requested fields
	pub fields: Vec<FieldDescriptor>,
	pub should_use_native_validation: bool,
}

/// Values and errors produced by a resolver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverOutput {
	pub values: Value,
	pub errors: ErrorMap,
}

/// Whole-form validator
#[async_trait]
pub trait Resolver: Send + Sync {
	async fn resolve(
		&self,
		values: Value,
		context: Option<Value>,
		options: ResolverOptions,
	) -> anyhow::Result<ResolverOutput>;
}

/// Resolver backed by a synchronous closure
pub struct FnResolver<F>(F);

/// Wrap a closure as a [`Resolver`]
pub fn resolver_fn<F>(resolve: F) -> FnResolver<F>
where
	F: Fn(Value, Option<Value>, ResolverOptions) -> anyhow::Result<ResolverOutput>
		+ Send
		+ Sync
		+ 'static,
{
	FnResolver(resolve)
}

#[async_trait]
impl<F> Resolver for FnResolver<F>
where
	F: Fn(Value, Option<Value>, ResolverOptions) -> anyhow::Result<ResolverOutput>
		+ Send
		+ Sync
		+ 'static,
{
	async fn resolve(
		&self,
		values: Value,
		context: Option<Value>,
		options: ResolverOptions,
	) -> anyhow::Result<ResolverOutput> {
		(self.0)(values, context, options)
	}
}

/// Find the error a resolver reported for `name`
///
/// When nothing is reported at `name` itself, walks up its ancestors and
/// returns the first one carrying an error, stopping at an ancestor that is
/// itself a registered field. Returns the error and the path it lives at.
pub(crate) fn schema_error_lookup(
	errors: &ErrorMap,
	is_field_boundary: impl Fn(&str) -> bool,
	name: &str,
) -> (Option<crate::FieldError>, String) {
	if let Some(error) = errors.get(name) {
		return (Some(error.clone()), name.to_string());
	}
	let segments = crate::path::segments(name);
	if segments.len() < 2 {
		return (None, name.to_string());
	}

	for end in (1..segments.len()).rev() {
		let ancestor = segments[..end].join(".");
		if is_field_boundary(&ancestor) {
			break;
		}
		if let Some(error) = errors.get(&ancestor) {
			return (Some(error.clone()), ancestor);
		}
	}
	(None, name.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error_map::{ErrorType, FieldError};
	use rstest::rstest;
	use serde_json::json;

	fn errors(entries: &[(&str, &str)]) -> ErrorMap {
		entries
			.iter()
			.map(|(k, m)| (k.to_string(), FieldError::new(ErrorType::Validate, *m)))
			.collect()
	}

	#[rstest]
	fn test_lookup_exact_hit() {
		let map = errors(&[("a.b", "x")]);

		let (error, name) = schema_error_lookup(&map, |_| false, "a.b");

		assert_eq!(error.unwrap().message, "x");
		assert_eq!(name, "a.b");
	}

	#[rstest]
	fn test_lookup_walks_up_to_ancestor() {
		let map = errors(&[("range", "end before start")]);

		let (error, name) = schema_error_lookup(&map, |_| false, "range.end");

		assert_eq!(error.unwrap().message, "end before start");
		assert_eq!(name, "range");
	}

	#[rstest]
	fn test_lookup_stops_at_registered_ancestor() {
		let map = errors(&[("range", "end before start")]);

		let (error, name) = schema_error_lookup(&map, |n| n == "range", "range.end");

		assert!(error.is_none());
		assert_eq!(name, "range.end");
	}

	#[tokio::test]
	async fn test_fn_resolver_delegates() {
		let resolver = resolver_fn(|values, context, options| {
			assert_eq!(context, Some(json!("ctx")));
			assert_eq!(options.names, vec!["a".to_string()]);
			Ok(ResolverOutput {
				values,
				errors: ErrorMap::new(),
			})
		});
		let options = ResolverOptions {
			criteria_mode: CriteriaMode::FirstError,
			names: vec!["a".into()],
			fields: Vec::new(),
			should_use_native_validation: false,
		};

		let output = resolver
			.resolve(json!({"a": 1}), Some(json!("ctx")), options)
			.await
			.unwrap();

		assert_eq!(output.values, json!({"a": 1}));
		assert!(output.errors.is_empty());
	}
}
