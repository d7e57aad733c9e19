//! Lock-protected store state and the deferred publication queue

use crate::differ;
use crate::field_array::StableKey;
use crate::handle::HandleRef;
use crate::options::FormOptions;
use crate::path;
use crate::payload::{ArrayPayload, EventType, Subjects, WatchPayload};
use crate::registry::{FieldDescriptor, FieldRegistry, Names};
use crate::state::{FormState, FormStateUpdate, StateInterest};
use reinhardt_form_signals::is_path_prefix;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Something to deliver once the store lock is released
pub(crate) enum Outgoing {
	State(FormStateUpdate),
	Watch(WatchPayload),
	Array(ArrayPayload),
	Focus { handle: HandleRef, select: bool },
	SetValue { handle: HandleRef, value: Value },
}

/// Ordered queue of publications and handle effects
///
/// Observers may call back into the store, so nothing is delivered while the
/// lock is held.
#[derive(Default)]
pub(crate) struct Outbox(Vec<Outgoing>);

impl Outbox {
	pub(crate) fn watch(&mut self, name: Option<&str>, event: Option<EventType>, values: &Value) {
		self.0.push(Outgoing::Watch(WatchPayload {
			name: name.map(str::to_string),
			event,
			values: Arc::new(values.clone()),
		}));
	}

	pub(crate) fn array(&mut self, name: Option<&str>, values: &Value) {
		self.0.push(Outgoing::Array(ArrayPayload {
			name: name.map(str::to_string),
			values: Arc::new(values.clone()),
		}));
	}

	pub(crate) fn focus(&mut self, handle: HandleRef, select: bool) {
		self.0.push(Outgoing::Focus { handle, select });
	}

	pub(crate) fn set_value(&mut self, handle: HandleRef, value: Value) {
		self.0.push(Outgoing::SetValue { handle, value });
	}

	fn state(&mut self, update: FormStateUpdate) {
		self.0.push(Outgoing::State(update));
	}

	/// Deliver everything in queue order
	pub(crate) fn deliver(self, subjects: &Subjects) {
		for item in self.0 {
			match item {
				Outgoing::State(update) => {
					tracing::trace!(name = ?update.name, keys = ?update.keys(), "form state delta");
					subjects.state.next(&update);
				}
				Outgoing::Watch(payload) => subjects.watch.next(&payload),
				Outgoing::Array(payload) => subjects.array.next(&payload),
				Outgoing::Focus { handle, select } => {
					handle.focus();
					if select {
						handle.select();
					}
				}
				Outgoing::SetValue { handle, value } => handle.set_value(&value),
			}
		}
	}
}

/// Lifecycle flags
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Flags {
	/// The first mount pass ran
	pub(crate) mount: bool,
	/// A field-array action is being applied
	pub(crate) action: bool,
	/// A refresh is owed to watchers after unregistering
	pub(crate) watch: bool,
}

/// Stable keys of one field array
#[derive(Debug, Clone, Default)]
pub(crate) struct ArrayRows {
	pub(crate) keys: Vec<StableKey>,
	/// A structural edit awaits its effect pass
	pub(crate) actioned: bool,
}

impl ArrayRows {
	pub(crate) fn fresh(len: usize) -> Self {
		Self {
			keys: (0..len).map(|_| StableKey::generate()).collect(),
			actioned: false,
		}
	}

	/// Grow or shrink the key list to `len`
	pub(crate) fn fit(&mut self, len: usize) {
		self.keys.truncate(len);
		while self.keys.len() < len {
			self.keys.push(StableKey::generate());
		}
	}
}

pub(crate) struct FormInner {
	pub(crate) options: FormOptions,
	pub(crate) fields: FieldRegistry,
	pub(crate) values: Value,
	pub(crate) default_values: Value,
	pub(crate) state: FormState,
	pub(crate) names: Names,
	pub(crate) flags: Flags,
	pub(crate) interest: StateInterest,
	in_flight: HashMap<String, usize>,
	generations: HashMap<String, u64>,
	pub(crate) arrays: HashMap<String, ArrayRows>,
}

impl FormInner {
	pub(crate) fn new(options: FormOptions) -> Self {
		let default_values = options.default_values.clone();
		let values = if options.should_unregister {
			Value::Object(Map::new())
		} else {
			default_values.clone()
		};
		Self {
			options,
			fields: FieldRegistry::new(),
			values,
			default_values,
			state: FormState::default(),
			names: Names::default(),
			flags: Flags::default(),
			interest: StateInterest::default(),
			in_flight: HashMap::new(),
			generations: HashMap::new(),
			arrays: HashMap::new(),
		}
	}

	/// Apply `update` to the state and queue it
	pub(crate) fn emit(&mut self, outbox: &mut Outbox, update: FormStateUpdate) {
		self.state.apply(&update);
		outbox.state(update);
	}

	pub(crate) fn compute_is_dirty(&self) -> bool {
		differ::is_dirty(&self.values, &self.default_values)
	}

	pub(crate) fn is_field_dirty(&self, name: &str) -> bool {
		path::get(&self.state.dirty_fields, name).is_some_and(differ::has_marks)
	}

	pub(crate) fn is_field_touched(&self, name: &str) -> bool {
		path::get(&self.state.touched_fields, name).is_some_and(differ::has_marks)
	}

	pub(crate) fn value_at(&self, name: &str) -> Value {
		path::get_or(&self.values, name, Value::Null)
	}

	pub(crate) fn default_at(&self, name: &str) -> Value {
		path::get_or(&self.default_values, name, Value::Null)
	}

	/// Names of mounted fields, or every field before any mounted
	pub(crate) fn mounted_names(&self) -> Vec<String> {
		if self.names.mount.is_empty() {
			self.fields.names().map(str::to_string).collect()
		} else {
			self.names.mount.iter().cloned().collect()
		}
	}

	pub(crate) fn descriptors(&self) -> Vec<FieldDescriptor> {
		self.fields.iter().cloned().collect()
	}

	/// Descriptors at or below any of `names`, deduplicated
	pub(crate) fn descriptors_under(&self, names: &[String]) -> Vec<FieldDescriptor> {
		self.fields
			.iter()
			.filter(|field| names.iter().any(|name| is_path_prefix(name, field.name())))
			.cloned()
			.collect()
	}

	/// A registered ancestor stops the resolver error walk
	pub(crate) fn is_field_boundary(&self, path: &str) -> bool {
		self.fields.contains(path) || self.names.array.contains(path)
	}

	/// Where a field's own error lives
	pub(crate) fn error_key(&self, name: &str) -> String {
		if self.names.array.contains(name) {
			path::join(name, "root")
		} else {
			name.to_string()
		}
	}

	/// Seed a field's value on registration
	///
	/// An existing value wins, then the explicit registration value, then the
	/// default. Returns the value the field ends up with.
	pub(crate) fn seed_value(&mut self, name: &str, explicit: Option<Value>) -> Option<Value> {
		if let Some(current) = path::get(&self.values, name) {
			return Some(current.clone());
		}
		let seeded = explicit.or_else(|| path::get(&self.default_values, name).cloned())?;
		path::set(&mut self.values, name, seeded.clone());
		Some(seeded)
	}

	/// Update touched and dirty bookkeeping after a field event
	///
	/// Returns the delta when a tracked flag changed.
	pub(crate) fn update_touch_and_dirty(
		&mut self,
		name: &str,
		field_value: &Value,
		is_blur: bool,
		should_dirty: bool,
	) -> Option<FormStateUpdate> {
		let mut update = FormStateUpdate::named(name);
		let mut changed = false;

		if !is_blur || should_dirty {
			if self.interest.is_dirty {
				let is_dirty = self.compute_is_dirty();
				changed |= is_dirty != self.state.is_dirty;
				self.state.is_dirty = is_dirty;
				update.is_dirty = Some(is_dirty);
			}
			let was_dirty = self.is_field_dirty(name);
			let pristine = differ::deep_equal(&self.default_at(name), field_value);
			if pristine {
				path::unset(&mut self.state.dirty_fields, name);
			} else {
				path::set(&mut self.state.dirty_fields, name, Value::Bool(true));
			}
			if self.interest.dirty_fields {
				changed |= was_dirty == pristine;
				update.dirty_fields = Some(self.state.dirty_fields.clone());
			}
		}

		if is_blur && !self.is_field_touched(name) {
			path::set(&mut self.state.touched_fields, name, Value::Bool(true));
			if self.interest.touched_fields {
				changed = true;
				update.touched_fields = Some(self.state.touched_fields.clone());
			}
		}

		changed.then_some(update)
	}

	/// Bump and return the event generation of `name`
	pub(crate) fn next_generation(&mut self, name: &str) -> u64 {
		let generation = self.generations.entry(name.to_string()).or_default();
		*generation += 1;
		*generation
	}

	pub(crate) fn is_current_generation(&self, name: &str, generation: u64) -> bool {
		self.generations.get(name).copied().unwrap_or_default() == generation
	}

	pub(crate) fn begin_validating(&mut self, names: &[String], outbox: &mut Outbox) {
		for name in names {
			*self.in_flight.entry(name.clone()).or_default() += 1;
		}
		self.emit_validating(outbox);
	}

	pub(crate) fn end_validating(&mut self, names: &[String], outbox: &mut Outbox) {
		for name in names {
			if let Some(count) = self.in_flight.get_mut(name) {
				*count = count.saturating_sub(1);
				if *count == 0 {
					self.in_flight.remove(name);
				}
			}
		}
		self.emit_validating(outbox);
	}

	fn emit_validating(&mut self, outbox: &mut Outbox) {
		let fields: BTreeSet<String> = self.in_flight.keys().cloned().collect();
		let is_validating = !fields.is_empty();
		if !(self.interest.is_validating || self.interest.validating_fields) {
			self.state.is_validating = is_validating;
			self.state.validating_fields = fields;
			return;
		}
		let update = FormStateUpdate {
			is_validating: self.interest.is_validating.then_some(is_validating),
			validating_fields: self.interest.validating_fields.then_some(fields),
			..FormStateUpdate::default()
		};
		self.emit(outbox, update);
	}

	/// First field, in registration order, with an error at or below it
	pub(crate) fn first_error_handle(&self, scope: Option<&[String]>) -> Option<HandleRef> {
		self.fields
			.iter()
			.filter(|field| {
				scope.is_none_or(|names| names.iter().any(|n| is_path_prefix(n, field.name())))
			})
			.filter(|field| self.state.errors.has_errors_under(field.name()))
			.find_map(|field| field.primary_handle().cloned())
	}

	/// First field whose path starts with `prefix` and has a handle
	pub(crate) fn handle_with_prefix(&self, prefix: &str) -> Option<HandleRef> {
		self.fields
			.iter()
			.filter(|field| field.name().starts_with(prefix))
			.find_map(|field| field.primary_handle().cloned())
	}
}
