//! Aggregate form state, deltas and declared interest

use crate::error_map::{ErrorMap, FieldError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Aggregate state of a form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
	pub is_dirty: bool,
	pub is_validating: bool,
	pub is_valid: bool,
	pub is_submitting: bool,
	pub is_submitted: bool,
	pub is_submit_successful: bool,
	pub submit_count: u32,
	pub errors: ErrorMap,
	pub dirty_fields: Value,
	pub touched_fields: Value,
	pub validating_fields: BTreeSet<String>,
}

impl Default for FormState {
	fn default() -> Self {
		Self {
			is_dirty: false,
			is_validating: false,
			is_valid: false,
			is_submitting: false,
			is_submitted: false,
			is_submit_successful: false,
			submit_count: 0,
			errors: ErrorMap::new(),
			dirty_fields: Value::Object(Map::new()),
			touched_fields: Value::Object(Map::new()),
			validating_fields: BTreeSet::new(),
		}
	}
}

impl FormState {
	/// Merge a delta into this state
	pub fn apply(&mut self, update: &FormStateUpdate) {
		macro_rules! merge {
			($state:expr, $update:expr; $($field:ident),+) => {
				$(if let Some(value) = &$update.$field {
					$state.$field = value.clone();
				})+
			};
		}
		merge!(
			self, update;
			is_dirty,
			is_validating,
			is_valid,
			is_submitting,
			is_submitted,
			is_submit_successful,
			submit_count,
			errors,
			dirty_fields,
			touched_fields,
			validating_fields
		);
	}
}

/// Partial [`FormState`] published on the state channel
///
/// `name` scopes the delta to one path. A delta with no keys asks every
/// subscriber to refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStateUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_dirty: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_validating: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_valid: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_submitting: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_submitted: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_submit_successful: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub submit_count: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub errors: Option<ErrorMap>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dirty_fields: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub touched_fields: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub validating_fields: Option<BTreeSet<String>>,
}

impl FormStateUpdate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	/// Full snapshot of `state` as a delta
	pub fn snapshot(state: &FormState) -> Self {
		Self {
			name: None,
			is_dirty: Some(state.is_dirty),
			is_validating: Some(state.is_validating),
			is_valid: Some(state.is_valid),
			is_submitting: Some(state.is_submitting),
			is_submitted: Some(state.is_submitted),
			is_submit_successful: Some(state.is_submit_successful),
			submit_count: Some(state.submit_count),
			errors: Some(state.errors.clone()),
			dirty_fields: Some(state.dirty_fields.clone()),
			touched_fields: Some(state.touched_fields.clone()),
			validating_fields: Some(state.validating_fields.clone()),
		}
	}

	/// Keys carried by this delta, `name` excluded
	pub fn keys(&self) -> Vec<StateKey> {
		let present = [
			(StateKey::IsDirty, self.is_dirty.is_some()),
			(StateKey::IsValidating, self.is_validating.is_some()),
			(StateKey::IsValid, self.is_valid.is_some()),
			(StateKey::IsSubmitting, self.is_submitting.is_some()),
			(StateKey::IsSubmitted, self.is_submitted.is_some()),
			(StateKey::IsSubmitSuccessful, self.is_submit_successful.is_some()),
			(StateKey::SubmitCount, self.submit_count.is_some()),
			(StateKey::Errors, self.errors.is_some()),
			(StateKey::DirtyFields, self.dirty_fields.is_some()),
			(StateKey::TouchedFields, self.touched_fields.is_some()),
			(StateKey::ValidatingFields, self.validating_fields.is_some()),
		];
		present
			.into_iter()
			.filter_map(|(key, set)| set.then_some(key))
			.collect()
	}

	pub fn is_empty(&self) -> bool {
		self.keys().is_empty()
	}

	/// Overlay `other` onto this delta
	pub fn merge(&mut self, other: FormStateUpdate) {
		macro_rules! overlay {
			($target:expr, $other:expr; $($field:ident),+) => {
				$(if $other.$field.is_some() {
					$target.$field = $other.$field;
				})+
			};
		}
		overlay!(
			self, other;
			name,
			is_dirty,
			is_validating,
			is_valid,
			is_submitting,
			is_submitted,
			is_submit_successful,
			submit_count,
			errors,
			dirty_fields,
			touched_fields,
			validating_fields
		);
	}
}

/// Keys of [`FormState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
	IsDirty,
	IsValidating,
	IsValid,
	IsSubmitting,
	IsSubmitted,
	IsSubmitSuccessful,
	SubmitCount,
	Errors,
	DirtyFields,
	TouchedFields,
	ValidatingFields,
}

impl StateKey {
	/// Keys maintained only when some consumer declared interest
	pub const TRACKED: [StateKey; 7] = [
		StateKey::IsDirty,
		StateKey::DirtyFields,
		StateKey::TouchedFields,
		StateKey::ValidatingFields,
		StateKey::IsValidating,
		StateKey::IsValid,
		StateKey::Errors,
	];

	/// Submission lifecycle keys are delivered to every subscriber
	pub fn is_tracked(self) -> bool {
		Self::TRACKED.contains(&self)
	}
}

/// Set of state keys a consumer reads
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::{StateInterest, StateKey};
///
/// let interest = StateInterest::new().with(StateKey::IsValid).with(StateKey::Errors);
/// assert!(interest.contains(StateKey::IsValid));
/// assert!(!interest.contains(StateKey::IsDirty));
/// assert!(StateInterest::all().contains(StateKey::TouchedFields));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateInterest {
	pub is_dirty: bool,
	pub dirty_fields: bool,
	pub touched_fields: bool,
	pub validating_fields: bool,
	pub is_validating: bool,
	pub is_valid: bool,
	pub errors: bool,
}

impl StateInterest {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn all() -> Self {
		StateKey::TRACKED
			.into_iter()
			.fold(Self::new(), |interest, key| interest.with(key))
	}

	pub fn with(mut self, key: StateKey) -> Self {
		match key {
			StateKey::IsDirty => self.is_dirty = true,
			StateKey::DirtyFields => self.dirty_fields = true,
			StateKey::TouchedFields => self.touched_fields = true,
			StateKey::ValidatingFields => self.validating_fields = true,
			StateKey::IsValidating => self.is_validating = true,
			StateKey::IsValid => self.is_valid = true,
			StateKey::Errors => self.errors = true,
			_ => {}
		}
		self
	}

	/// Untracked keys always count as contained
	pub fn contains(&self, key: StateKey) -> bool {
		match key {
			StateKey::IsDirty => self.is_dirty,
			StateKey::DirtyFields => self.dirty_fields,
			StateKey::TouchedFields => self.touched_fields,
			StateKey::ValidatingFields => self.validating_fields,
			StateKey::IsValidating => self.is_validating,
			StateKey::IsValid => self.is_valid,
			StateKey::Errors => self.errors,
			_ => true,
		}
	}

	pub fn union(self, other: Self) -> Self {
		Self {
			is_dirty: self.is_dirty || other.is_dirty,
			dirty_fields: self.dirty_fields || other.dirty_fields,
			touched_fields: self.touched_fields || other.touched_fields,
			validating_fields: self.validating_fields || other.validating_fields,
			is_validating: self.is_validating || other.is_validating,
			is_valid: self.is_valid || other.is_valid,
			errors: self.errors || other.errors,
		}
	}

	fn count(&self) -> usize {
		StateKey::TRACKED
			.into_iter()
			.filter(|key| self.contains(*key))
			.count()
	}
}

impl FromIterator<StateKey> for StateInterest {
	fn from_iter<I: IntoIterator<Item = StateKey>>(iter: I) -> Self {
		iter.into_iter().fold(Self::new(), Self::with)
	}
}

/// Whether a subscriber with `interest` should react to `update`
///
/// Empty deltas, deltas carrying at least as many keys as the subscriber
/// tracks, and deltas containing any declared or lifecycle key are relevant.
pub fn should_render_form_state(update: &FormStateUpdate, interest: &StateInterest) -> bool {
	let keys = update.keys();
	keys.is_empty()
		|| (interest.count() > 0 && keys.len() >= interest.count())
		|| keys.iter().any(|key| interest.contains(*key))
}

/// Per-field view returned by `get_field_state`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldState {
	/// An error exists at or below the path
	pub invalid: bool,
	pub is_dirty: bool,
	pub is_touched: bool,
	pub error: Option<FieldError>,
}
