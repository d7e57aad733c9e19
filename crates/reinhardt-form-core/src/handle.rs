//! Live binding handles supplied by the UI binding layer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A live input control attached to a registered field
///
/// Only [`FieldHandle::focus`] is mandatory. The remaining hooks default to
/// no-ops so simple bindings stay small.
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::FieldHandle;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct TextInput {
///     focused: AtomicBool,
/// }
///
/// impl FieldHandle for TextInput {
///     fn focus(&self) {
///         self.focused.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let input = TextInput::default();
/// input.focus();
/// assert!(input.focused.load(Ordering::SeqCst));
/// assert!(input.is_connected());
/// ```
pub trait FieldHandle: Send + Sync {
	/// Move input focus to the control
	fn focus(&self);

	/// Select the control's content
	fn select(&self) {}

	/// Set the native validity message; empty clears it
	fn set_custom_validity(&self, message: &str) {
		let _ = message;
	}

	/// Ask the control to display its validity state
	fn report_validity(&self) -> bool {
		true
	}

	/// Whether the control is still attached to a rendered tree
	fn is_connected(&self) -> bool {
		true
	}

	/// Push a value written by the store into the control
	fn set_value(&self, value: &Value) {
		let _ = value;
	}
}

/// Shared handle reference
pub type HandleRef = Arc<dyn FieldHandle>;

/// Identity comparison of two handles
pub(crate) fn same_handle(a: &HandleRef, b: &HandleRef) -> bool {
	std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Kind of input a field is bound to, chosen by the binding layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
	/// Free text (the default)
	#[default]
	Text,
	/// Numeric input; an empty value is absent
	Number,
	/// Calendar date
	Date,
	/// Time of day, `HH:MM[:SS]`
	Time,
	/// ISO week, compared as text
	Week,
	/// Checkbox or checkbox group
	Checkbox,
	/// Radio group
	Radio,
	/// File picker; an empty value is absent
	File,
	/// Multi-select list
	SelectMultiple,
}

impl FieldKind {
	/// Radio and checkbox inputs collect several handles per field
	pub fn is_group(self) -> bool {
		matches!(self, Self::Checkbox | Self::Radio)
	}
}
