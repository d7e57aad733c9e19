//! Form configuration
//!
//! [`FormOptions`] is built in code; [`FormSettings`] is the serializable
//! subset that can be loaded from a JSON document.
//!
//! ```
//! use reinhardt_form_core::{FormOptions, FormSettings, ValidationMode};
//!
//! let settings = FormSettings::from_json(r#"{
//!     "mode": "onBlur",
//!     "delayError": 250,
//!     "defaultValues": {"email": ""}
//! }"#).unwrap();
//!
//! let options = FormOptions::from(settings);
//! assert_eq!(options.mode, ValidationMode::OnBlur);
//! assert_eq!(options.delay_error, Some(std::time::Duration::from_millis(250)));
//! ```

use crate::error::FormResult;
use crate::mode::{CriteriaMode, ReValidateMode, ValidationMode};
use crate::resolver::Resolver;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Options for [`FormControl::new`](crate::FormControl::new)
#[derive(Clone)]
pub struct FormOptions {
	pub mode: ValidationMode,
	pub re_validate_mode: ReValidateMode,
	pub criteria_mode: CriteriaMode,
	pub should_focus_error: bool,
	pub should_unregister: bool,
	pub should_use_native_validation: bool,
	/// Debounce before a field-event error is displayed
	pub delay_error: Option<Duration>,
	pub default_values: Value,
	/// Opaque value handed to the resolver
	pub context: Option<Value>,
	pub resolver: Option<Arc<dyn Resolver>>,
}

impl Default for FormOptions {
	fn default() -> Self {
		Self {
			mode: ValidationMode::default(),
			re_validate_mode: ReValidateMode::default(),
			criteria_mode: CriteriaMode::default(),
			should_focus_error: true,
			should_unregister: false,
			should_use_native_validation: false,
			delay_error: None,
			default_values: Value::Object(Map::new()),
			context: None,
			resolver: None,
		}
	}
}

impl FormOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_mode(mut self, mode: ValidationMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn with_re_validate_mode(mut self, mode: ReValidateMode) -> Self {
		self.re_validate_mode = mode;
		self
	}

	pub fn with_criteria_mode(mut self, mode: CriteriaMode) -> Self {
		self.criteria_mode = mode;
		self
	}

	pub fn with_should_focus_error(mut self, should_focus_error: bool) -> Self {
		self.should_focus_error = should_focus_error;
		self
	}

	pub fn with_should_unregister(mut self, should_unregister: bool) -> Self {
		self.should_unregister = should_unregister;
		self
	}

	pub fn with_native_validation(mut self, enabled: bool) -> Self {
		self.should_use_native_validation = enabled;
		self
	}

	pub fn with_delay_error(mut self, delay: Duration) -> Self {
		self.delay_error = Some(delay);
		self
	}

	/// Default values; anything but an object is ignored
	pub fn with_default_values(mut self, values: Value) -> Self {
		if values.is_object() {
			self.default_values = values;
		}
		self
	}

	pub fn with_context(mut self, context: Value) -> Self {
		self.context = Some(context);
		self
	}

	pub fn with_resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
		self.resolver = Some(Arc::new(resolver));
		self
	}
}

impl fmt::Debug for FormOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormOptions")
			.field("mode", &self.mode)
			.field("re_validate_mode", &self.re_validate_mode)
			.field("criteria_mode", &self.criteria_mode)
			.field("should_focus_error", &self.should_focus_error)
			.field("should_unregister", &self.should_unregister)
			.field("should_use_native_validation", &self.should_use_native_validation)
			.field("delay_error", &self.delay_error)
			.field("default_values", &self.default_values)
			.field("has_resolver", &self.resolver.is_some())
			.finish()
	}
}

fn default_true() -> bool {
	true
}

/// Serializable form configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
	pub mode: ValidationMode,
	pub re_validate_mode: ReValidateMode,
	pub criteria_mode: CriteriaMode,
	#[serde(default = "default_true")]
	pub should_focus_error: bool,
	pub should_unregister: bool,
	pub should_use_native_validation: bool,
	/// Milliseconds
	pub delay_error: Option<u64>,
	pub default_values: Option<Value>,
	pub context: Option<Value>,
}

impl Default for FormSettings {
	fn default() -> Self {
		Self {
			mode: ValidationMode::default(),
			re_validate_mode: ReValidateMode::default(),
			criteria_mode: CriteriaMode::default(),
			should_focus_error: true,
			should_unregister: false,
			should_use_native_validation: false,
			delay_error: None,
			default_values: None,
			context: None,
		}
	}
}

impl FormSettings {
	/// Parse settings from a JSON document
	pub fn from_json(json: &str) -> FormResult<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

impl From<FormSettings> for FormOptions {
	fn from(settings: FormSettings) -> Self {
		let options = FormOptions {
			mode: settings.mode,
			re_validate_mode: settings.re_validate_mode,
			criteria_mode: settings.criteria_mode,
			should_focus_error: settings.should_focus_error,
			should_unregister: settings.should_unregister,
			should_use_native_validation: settings.should_use_native_validation,
			delay_error: settings.delay_error.map(Duration::from_millis),
			context: settings.context,
			..FormOptions::default()
		};
		match settings.default_values {
			Some(values) => options.with_default_values(values),
			None => options,
		}
	}
}

/// Options for `set_value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetValueOptions {
	pub should_dirty: bool,
	pub should_touch: bool,
	pub should_validate: bool,
}

impl SetValueOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn dirty(mut self) -> Self {
		self.should_dirty = true;
		self
	}

	pub fn touch(mut self) -> Self {
		self.should_touch = true;
		self
	}

	pub fn validate(mut self) -> Self {
		self.should_validate = true;
		self
	}
}

/// Options for `trigger_with`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerOptions {
	pub should_focus: bool,
}

/// Options for `set_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetErrorOptions {
	pub should_focus: bool,
}

/// Options for `set_focus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetFocusOptions {
	pub should_select: bool,
}

/// Which parts of the state survive a `reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetOptions {
	pub keep_default_values: bool,
	pub keep_values: bool,
	/// Keep values of dirty fields, reset the rest
	pub keep_dirty_values: bool,
	pub keep_errors: bool,
	pub keep_dirty: bool,
	pub keep_touched: bool,
	pub keep_is_submitted: bool,
	pub keep_is_submit_successful: bool,
	pub keep_submit_count: bool,
	pub keep_is_valid: bool,
}

/// Options for `reset_field`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResetFieldOptions {
	/// New default for the field; the current default is used when absent
	pub default_value: Option<Value>,
	pub keep_error: bool,
	pub keep_dirty: bool,
	pub keep_touched: bool,
}

/// Which parts of a field survive `unregister`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnregisterOptions {
	pub keep_value: bool,
	pub keep_error: bool,
	pub keep_dirty: bool,
	pub keep_touched: bool,
	pub keep_default_value: bool,
	pub keep_is_valid: bool,
}
