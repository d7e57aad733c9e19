//! Per-field rule evaluation
//!
//! Rules run in a fixed order: `required`, `min`/`max`, `maxLength`/`minLength`,
//! `pattern`, then `validate`. The first failure wins unless every criterion
//! is collected, in which case all failures are recorded in
//! [`FieldError::types`] and the last one becomes the reported type.

use crate::error_map::{ErrorType, FieldError};
use crate::handle::{FieldKind, HandleRef};
use crate::mode::CriteriaMode;
use crate::registry::FieldDescriptor;
use crate::rules::{Bound, RuleValue, Validate, Validity};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// How a single field is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateOptions {
	pub criteria_mode: CriteriaMode,
	/// Report validity through the live handle
	pub should_use_native_validation: bool,
	/// The field is a field-array root and its value is the whole list
	pub is_field_array: bool,
}

/// Parse date, date-time or RFC 3339 text into an instant
pub(crate) fn parse_instant(text: &str) -> Option<DateTime<FixedOffset>> {
	let text = text.trim();
	if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
		return Some(instant);
	}
	let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
		.or_else(|| {
			NaiveDate::parse_from_str(text, "%Y-%m-%d")
				.ok()
				.and_then(|date| date.and_hms_opt(0, 0, 0))
		})?;
	Some(Utc.from_utc_datetime(&naive).fixed_offset())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
	let text = text.trim();
	NaiveTime::parse_from_str(text, "%H:%M:%S")
		.or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
		.ok()
}

fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::Bool(b) => Some(f64::from(u8::from(*b))),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

fn is_blank(value: &Value, blank_is_absent: bool) -> bool {
	match value {
		Value::Null => blank_is_absent,
		Value::String(text) => text.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

fn checkbox_checked(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::String(text) => !text.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Null => false,
		_ => true,
	}
}

fn radio_selected(value: &Value) -> bool {
	!matches!(value, Value::Null | Value::Bool(false)) && value != ""
}

/// Whether `value` lies outside a temporal bound
///
/// Returns `(exceeds_max, below_min)`.
fn compare_temporal(
	kind: FieldKind,
	value: &str,
	max: Option<&Bound>,
	min: Option<&Bound>,
) -> (bool, bool) {
	fn text(bound: Option<&Bound>) -> Option<&str> {
		match bound {
			Some(Bound::Date(text)) => Some(text),
			_ => None,
		}
	}
	match kind {
		FieldKind::Time => {
			let Some(value) = parse_time(value) else {
				return (false, false);
			};
			let above = text(max).and_then(parse_time).is_some_and(|max| value > max);
			let below = text(min).and_then(parse_time).is_some_and(|min| value < min);
			(above, below)
		}
		FieldKind::Week => (
			text(max).is_some_and(|max| value > max),
			text(min).is_some_and(|min| value < min),
		),
		_ => {
			let Some(value) = parse_instant(value) else {
				return (false, false);
			};
			let above = text(max).and_then(parse_instant).is_some_and(|max| value > max);
			let below = text(min).and_then(parse_instant).is_some_and(|min| value < min);
			(above, below)
		}
	}
}

struct Collector<'a> {
	all: bool,
	native: bool,
	input: Option<&'a HandleRef>,
	error: Option<FieldError>,
}

impl Collector<'_> {
	fn record(&mut self, error_type: ErrorType, message: &str) {
		let mut types = BTreeMap::new();
		if self.all {
			if let Some(previous) = self.error.take() {
				types = previous.types;
			}
			types.insert(error_type.to_string(), message.to_string());
		}
		self.error = Some(FieldError {
			error_type,
			message: message.to_string(),
			types,
			handle: self.input.cloned(),
		});
	}

	/// Record and decide whether evaluation stops here
	fn fail(&mut self, error_type: ErrorType, message: &str) -> bool {
		self.record(error_type, message);
		if !self.all {
			self.report(Some(message));
		}
		!self.all
	}

	fn report(&self, message: Option<&str>) {
		if !self.native {
			return;
		}
		let Some(input) = self.input else {
			return;
		};
		match message {
			Some("") => input.set_custom_validity(" "),
			Some(message) => input.set_custom_validity(message),
			None => input.set_custom_validity(""),
		}
		input.report_validity();
	}

	fn finish(self) -> Option<FieldError> {
		self.report(self.error.as_ref().map(|e| e.message.as_str()));
		self.error
	}
}

fn failed_message<T>(rule: &RuleValue<T>) -> &str {
	&rule.message
}

/// Validate one field against its declared rules
///
/// Unmounted and disabled fields are always valid. `value` is the field's
/// current value; `form_values` is handed to custom predicates.
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::validation::{validate_field, ValidateOptions};
/// use reinhardt_form_core::{ErrorType, FieldDescriptor, RegisterOptions};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let field = FieldDescriptor::new("name", RegisterOptions::new().with_required("Name is required"));
/// let values = Arc::new(json!({"name": ""}));
///
/// let error = validate_field(&field, Some(&json!("")), &values, ValidateOptions::default()).await;
///
/// let error = error.unwrap();
/// assert_eq!(error.error_type, ErrorType::Required);
/// assert_eq!(error.message, "Name is required");
/// # });
/// ```
pub async fn validate_field(
	field: &FieldDescriptor,
	value: Option<&Value>,
	form_values: &Arc<Value>,
	options: ValidateOptions,
) -> Option<FieldError> {
	let rules = field.options();
	if !field.is_mounted() || rules.disabled {
		return None;
	}

	let null = Value::Null;
	let value = value.unwrap_or(&null);
	let kind = rules.kind;
	let mut collector = Collector {
		all: options.criteria_mode == CriteriaMode::All,
		native: options.should_use_native_validation,
		input: field.primary_handle(),
		error: None,
	};
	let is_empty = is_blank(value, rules.treats_blank_as_absent());

	if let Some(required) = rules.required.as_ref().filter(|r| r.value) {
		let missing = if options.is_field_array {
			!matches!(value, Value::Array(items) if !items.is_empty())
		} else {
			(!kind.is_group() && (is_empty || value.is_null()))
				|| value == &Value::Bool(false)
				|| (kind == FieldKind::Checkbox && !checkbox_checked(value))
				|| (kind == FieldKind::Radio && !radio_selected(value))
		};
		if missing && collector.fail(ErrorType::Required, failed_message(required)) {
			return collector.error;
		}
	}

	if !is_empty && (rules.min.is_some() || rules.max.is_some()) {
		let max = rules.max.as_ref();
		let min = rules.min.as_ref();
		let (above, below) = match as_number(value) {
			Some(number) => (
				max.and_then(|r| r.value.as_number()).is_some_and(|max| number > max),
				min.and_then(|r| r.value.as_number()).is_some_and(|min| number < min),
			),
			None => match value.as_str() {
				Some(text) => {
					compare_temporal(kind, text, max.map(|r| &r.value), min.map(|r| &r.value))
				}
				None => (false, false),
			},
		};
		let failure = if above {
			max.map(|r| (ErrorType::Max, failed_message(r)))
		} else if below {
			min.map(|r| (ErrorType::Min, failed_message(r)))
		} else {
			None
		};
		if let Some((error_type, message)) = failure {
			if collector.fail(error_type, message) {
				return collector.error;
			}
		}
	}

	if (rules.max_length.is_some() || rules.min_length.is_some()) && !is_empty {
		let length = match value {
			Value::String(text) => Some(text.chars().count()),
			Value::Array(items) if options.is_field_array => Some(items.len()),
			_ => None,
		};
		if let Some(length) = length {
			let too_long = rules.max_length.as_ref().filter(|r| length > r.value);
			let too_short = rules.min_length.as_ref().filter(|r| length < r.value);
			let failure = match (too_long, too_short) {
				(Some(rule), _) => Some((ErrorType::MaxLength, failed_message(rule))),
				(None, Some(rule)) => Some((ErrorType::MinLength, failed_message(rule))),
				_ => None,
			};
			if let Some((error_type, message)) = failure {
				if collector.fail(error_type, message) {
					return collector.error;
				}
			}
		}
	}

	if let (Some(pattern), false, Some(text)) = (&rules.pattern, is_empty, value.as_str()) {
		if !pattern.value.is_match(text)
			&& collector.fail(ErrorType::Pattern, failed_message(pattern))
		{
			return collector.error;
		}
	}

	match &rules.validate {
		Some(Validate::Single(predicate)) => {
			let outcome = predicate.call(value.clone(), Arc::clone(form_values)).await;
			if let Validity::Invalid(message) = outcome {
				if collector.fail(ErrorType::Validate, &message) {
					return collector.error;
				}
			}
		}
		Some(Validate::Named(predicates)) => {
			let mut failed = false;
			for (name, predicate) in predicates {
				if failed && !collector.all {
					break;
				}
				let outcome = predicate.call(value.clone(), Arc::clone(form_values)).await;
				if let Validity::Invalid(message) = outcome {
					failed = true;
					collector.record(ErrorType::from(name.as_str()), &message);
					collector.report(Some(&message));
				}
			}
			if failed && !collector.all {
				return collector.error;
			}
		}
		None => {}
	}

	collector.finish()
}
