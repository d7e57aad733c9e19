//! Registration options and validation rules
//!
//! Rules are attached to a field when it is registered. Every rule accepts a
//! bare value or a `(value, message)` pair:
//!
//! ```
//! use reinhardt_form_core::{Bound, FieldKind, RegisterOptions};
//! use regex::Regex;
//!
//! let options = RegisterOptions::new()
//!     .with_kind(FieldKind::Number)
//!     .with_required("Age is required")
//!     .with_min((18, "Too young"))
//!     .with_max(Bound::Number(130.0));
//!
//! let username = RegisterOptions::new()
//!     .required()
//!     .with_min_length((3, "At least three characters"))
//!     .with_pattern(Regex::new(r"^[a-z0-9_]+$").unwrap());
//!
//! assert!(options.has_validation());
//! assert!(username.has_validation());
//! ```

use crate::handle::FieldKind;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A rule value with the message reported when it fails
#[derive(Debug, Clone, PartialEq)]
pub struct RuleValue<T> {
	pub value: T,
	pub message: String,
}

impl<T> RuleValue<T> {
	/// Rule without a message
	pub fn new(value: T) -> Self {
		Self {
			value,
			message: String::new(),
		}
	}

	/// Set the failure message
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();
		self
	}
}

macro_rules! rule_value_from {
	($target:ty => $($source:ty),+) => {
		$(
			impl From<$source> for RuleValue<$target> {
				fn from(value: $source) -> Self {
					Self::new(value.into())
				}
			}

			impl From<($source, &str)> for RuleValue<$target> {
				fn from((value, message): ($source, &str)) -> Self {
					Self::new(value.into()).with_message(message)
				}
			}
		)+
	};
}

rule_value_from!(bool => bool);
rule_value_from!(usize => usize);
rule_value_from!(Bound => Bound, f64, i32);
rule_value_from!(Regex => Regex);

/// A bare message marks the field required
impl From<&str> for RuleValue<bool> {
	fn from(message: &str) -> Self {
		Self::new(true).with_message(message)
	}
}

impl From<String> for RuleValue<bool> {
	fn from(message: String) -> Self {
		Self::new(true).with_message(message)
	}
}

/// Lower or upper bound for `min`/`max`
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
	/// Compared against numeric values
	Number(f64),
	/// Date, date-time or time text compared against temporal values
	Date(String),
}

impl Bound {
	/// Date bound from text such as `2024-01-31`
	pub fn date(value: impl Into<String>) -> Self {
		Self::Date(value.into())
	}

	pub(crate) fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			Self::Date(text) => text.trim().parse().ok(),
		}
	}
}

impl From<f64> for Bound {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for Bound {
	fn from(value: i32) -> Self {
		Self::Number(f64::from(value))
	}
}

/// Outcome of a custom predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
	Valid,
	/// Invalid with a message, which may be empty
	Invalid(String),
}

impl Validity {
	pub fn invalid(message: impl Into<String>) -> Self {
		Self::Invalid(message.into())
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Valid)
	}
}

/// `true` is valid, `false` is invalid without a message
impl From<bool> for Validity {
	fn from(valid: bool) -> Self {
		if valid {
			Self::Valid
		} else {
			Self::Invalid(String::new())
		}
	}
}

/// A message is always a failure
impl From<&str> for Validity {
	fn from(message: &str) -> Self {
		Self::Invalid(message.to_string())
	}
}

impl From<String> for Validity {
	fn from(message: String) -> Self {
		Self::Invalid(message)
	}
}

impl From<Option<String>> for Validity {
	fn from(message: Option<String>) -> Self {
		message.map_or(Self::Valid, Self::Invalid)
	}
}

impl<E: Into<String>> From<Result<(), E>> for Validity {
	fn from(result: Result<(), E>) -> Self {
		match result {
			Ok(()) => Self::Valid,
			Err(message) => Self::Invalid(message.into()),
		}
	}
}

/// Boxed future returned by predicates
pub type ValidateFuture = BoxFuture<'static, Validity>;

type PredicateFn = dyn Fn(Value, Arc<Value>) -> ValidateFuture + Send + Sync;

/// A custom predicate receiving the field value and the whole values tree
#[derive(Clone)]
pub struct ValidateFn(Arc<PredicateFn>);

impl ValidateFn {
	/// Synchronous predicate
	///
	/// ```
	/// use reinhardt_form_core::ValidateFn;
	///
	/// let not_admin = ValidateFn::new(|value, _values| value != "admin");
	/// let with_message = ValidateFn::new(|value, _values| {
	///     if value.as_str().is_some_and(|s| s.contains(' ')) {
	///         Some("No spaces".to_string())
	///     } else {
	///         None
	///     }
	/// });
	/// # let _ = (not_admin, with_message);
	/// ```
	pub fn new<F, R>(predicate: F) -> Self
	where
		F: Fn(&Value, &Value) -> R + Send + Sync + 'static,
		R: Into<Validity>,
	{
		Self(Arc::new(move |value, values| {
			future::ready(predicate(&value, &values).into()).boxed()
		}))
	}

	/// Asynchronous predicate; validation suspends at this call
	pub fn new_async<F, Fut, R>(predicate: F) -> Self
	where
		F: Fn(Value, Arc<Value>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<Validity>,
	{
		Self(Arc::new(move |value, values| {
			let pending = predicate(value, values);
			async move { pending.await.into() }.boxed()
		}))
	}

	pub(crate) fn call(&self, value: Value, values: Arc<Value>) -> ValidateFuture {
		(self.0)(value, values)
	}
}

impl fmt::Debug for ValidateFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ValidateFn")
	}
}

/// The `validate` rule
#[derive(Debug, Clone)]
pub enum Validate {
	/// One predicate reported as type `validate`
	Single(ValidateFn),
	/// Named predicates evaluated in declaration order; the name is the type
	Named(Vec<(String, ValidateFn)>),
}

/// Coercion applied to values arriving from field events
#[derive(Clone)]
pub enum ValueAs {
	/// Parse into a number; empty text becomes `null`
	Number,
	/// Parse text into an RFC 3339 timestamp
	Date,
	/// Caller-supplied transform
	Custom(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl ValueAs {
	pub fn custom<F>(transform: F) -> Self
	where
		F: Fn(&Value) -> Value + Send + Sync + 'static,
	{
		Self::Custom(Arc::new(transform))
	}

	/// Apply the coercion
	///
	/// ```
	/// use reinhardt_form_core::ValueAs;
	/// use serde_json::json;
	///
	/// assert_eq!(ValueAs::Number.apply(&json!("42")), json!(42.0));
	/// assert_eq!(ValueAs::Number.apply(&json!("")), json!(null));
	/// ```
	pub fn apply(&self, value: &Value) -> Value {
		match self {
			Self::Number => match value {
				Value::String(text) if text.trim().is_empty() => Value::Null,
				Value::String(text) => text
					.trim()
					.parse::<f64>()
					.ok()
					.and_then(serde_json::Number::from_f64)
					.map_or(Value::Null, Value::Number),
				Value::Bool(b) => Value::from(u8::from(*b)),
				other => other.clone(),
			},
			Self::Date => match value {
				Value::String(text) => crate::validation::parse_instant(text)
					.map_or(Value::Null, |instant| Value::String(instant.to_rfc3339())),
				other => other.clone(),
			},
			Self::Custom(transform) => transform(value),
		}
	}
}

impl fmt::Debug for ValueAs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number => f.write_str("Number"),
			Self::Date => f.write_str("Date"),
			Self::Custom(_) => f.write_str("Custom"),
		}
	}
}

/// Options for [`FormControl::register`](crate::FormControl::register)
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
	pub kind: FieldKind,
	pub required: Option<RuleValue<bool>>,
	pub min: Option<RuleValue<Bound>>,
	pub max: Option<RuleValue<Bound>>,
	pub min_length: Option<RuleValue<usize>>,
	pub max_length: Option<RuleValue<usize>>,
	pub pattern: Option<RuleValue<Regex>>,
	pub validate: Option<Validate>,
	pub value_as: Option<ValueAs>,
	/// Paths re-validated after this field's own event validation
	pub deps: Vec<String>,
	/// Initial value used when neither values nor defaults have one
	pub value: Option<Value>,
	pub should_unregister: bool,
	/// Disabled fields are never validated
	pub disabled: bool,
}

impl RegisterOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_kind(mut self, kind: FieldKind) -> Self {
		self.kind = kind;
		self
	}

	/// Mark the field required without a message
	pub fn required(self) -> Self {
		self.with_required(true)
	}

	pub fn with_required(mut self, rule: impl Into<RuleValue<bool>>) -> Self {
		self.required = Some(rule.into());
		self
	}

	pub fn with_min(mut self, rule: impl Into<RuleValue<Bound>>) -> Self {
		self.min = Some(rule.into());
		self
	}

	pub fn with_max(mut self, rule: impl Into<RuleValue<Bound>>) -> Self {
		self.max = Some(rule.into());
		self
	}

	pub fn with_min_length(mut self, rule: impl Into<RuleValue<usize>>) -> Self {
		self.min_length = Some(rule.into());
		self
	}

	pub fn with_max_length(mut self, rule: impl Into<RuleValue<usize>>) -> Self {
		self.max_length = Some(rule.into());
		self
	}

	pub fn with_pattern(mut self, rule: impl Into<RuleValue<Regex>>) -> Self {
		self.pattern = Some(rule.into());
		self
	}

	/// Single predicate
	pub fn with_validate(mut self, predicate: ValidateFn) -> Self {
		self.validate = Some(Validate::Single(predicate));
		self
	}

	/// Add a named predicate; the name becomes the error type
	pub fn with_named_validate(mut self, name: impl Into<String>, predicate: ValidateFn) -> Self {
		let entry = (name.into(), predicate);
		match &mut self.validate {
			Some(Validate::Named(entries)) => entries.push(entry),
			_ => self.validate = Some(Validate::Named(vec![entry])),
		}
		self
	}

	pub fn with_value_as(mut self, value_as: ValueAs) -> Self {
		self.value_as = Some(value_as);
		self
	}

	pub fn with_deps<I, S>(mut self, deps: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.deps = deps.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_value(mut self, value: Value) -> Self {
		self.value = Some(value);
		self
	}

	pub fn with_should_unregister(mut self, should_unregister: bool) -> Self {
		self.should_unregister = should_unregister;
		self
	}

	pub fn disabled(mut self) -> Self {
		self.disabled = true;
		self
	}

	/// Whether any rule is declared
	pub fn has_validation(&self) -> bool {
		self.required.as_ref().is_some_and(|r| r.value)
			|| self.min.is_some()
			|| self.max.is_some()
			|| self.min_length.is_some()
			|| self.max_length.is_some()
			|| self.pattern.is_some()
			|| self.validate.is_some()
	}

	pub(crate) fn coerce(&self, value: Value) -> Value {
		match &self.value_as {
			Some(value_as) => value_as.apply(&value),
			None => value,
		}
	}

	pub(crate) fn treats_blank_as_absent(&self) -> bool {
		matches!(self.kind, FieldKind::Number | FieldKind::File)
			|| matches!(self.value_as, Some(ValueAs::Number))
	}
}
