//! Field registration, handle binding and unregistration

use super::events::FieldEvent;
use super::{FormControl, Outbox};
use crate::error::FormResult;
use crate::handle::HandleRef;
use crate::options::UnregisterOptions;
use crate::path;
use crate::rules::RegisterOptions;
use crate::state::FormStateUpdate;
use serde_json::Value;
use std::fmt;

/// Binding returned by [`FormControl::register`]
///
/// The binding layer forwards input events and element lifecycle through it.
#[derive(Clone)]
pub struct FieldRegistration {
	control: FormControl,
	name: String,
	options: RegisterOptions,
}

impl FieldRegistration {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn options(&self) -> &RegisterOptions {
		&self.options
	}

	/// Input changed to `value`
	pub async fn on_change(&self, value: Value) -> FormResult<()> {
		self.control
			.handle_field_event(&self.name, FieldEvent::Change(value))
			.await
	}

	/// Input lost focus
	pub async fn on_blur(&self) -> FormResult<()> {
		self.control.handle_field_event(&self.name, FieldEvent::Blur).await
	}

	/// Bind a live handle, or report the element gone with `None`
	pub fn attach(&self, handle: Option<HandleRef>) {
		self.control.attach_handle(&self.name, &self.options, handle);
	}
}

impl fmt::Debug for FieldRegistration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldRegistration")
			.field("name", &self.name)
			.finish()
	}
}

impl FormControl {
	/// Register a field, or update the rules of an existing one
	///
	/// A new field's value is seeded from the current value, then the
	/// registration value, then the default value.
	pub fn register(&self, name: &str, options: RegisterOptions) -> FieldRegistration {
		let name = path::normalize(name);
		{
			let mut inner = self.lock();
			let is_new = inner.fields.upsert(&name, options.clone());
			inner.names.mount.insert(name.clone());
			inner.names.un_mount.shift_remove(&name);
			if is_new {
				inner.seed_value(&name, options.value.clone());
			}
			tracing::debug!(field = %name, new = is_new, "field registered");
		}
		FieldRegistration {
			control: self.clone(),
			name,
			options,
		}
	}

	fn attach_handle(&self, name: &str, options: &RegisterOptions, handle: Option<HandleRef>) {
		let Some(handle) = handle else {
			self.detach_handle(name, options);
			return;
		};
		self.register(name, options.clone());
		let seeded = {
			let mut inner = self.lock();
			let attached = inner
				.fields
				.get_mut(name)
				.is_some_and(|field| field.attach(handle.clone()));
			if !attached {
				return;
			}
			inner.seed_value(name, None)
		};
		tracing::trace!(field = %name, "handle attached");
		if let Some(value) = seeded {
			handle.set_value(&value);
		}
	}

	fn detach_handle(&self, name: &str, options: &RegisterOptions) {
		let mut inner = self.lock();
		if let Some(field) = inner.fields.get_mut(name) {
			field.set_mount(false);
		}
		let should_unregister = inner.options.should_unregister || options.should_unregister;
		if should_unregister && !(inner.names.is_in_field_array(name) && inner.flags.action) {
			inner.names.un_mount.insert(name.to_string());
			inner.flags.watch = true;
		}
		tracing::trace!(field = %name, queued = should_unregister, "handle detached");
	}

	/// Remove fields and, unless kept, their values and bookkeeping
	pub async fn unregister(&self, names: &[&str], options: UnregisterOptions) -> FormResult<()> {
		let names: Vec<String> = if names.is_empty() {
			self.lock().names.mount.iter().cloned().collect()
		} else {
			names.iter().map(|name| path::normalize(name)).collect()
		};

		let mut outbox = Outbox::default();
		let refresh = {
			let mut inner = self.lock();
			for name in &names {
				inner.names.mount.shift_remove(name);
				inner.names.array.shift_remove(name);
				inner.arrays.remove(name);
				inner.fields.remove_tree(name);
				if !options.keep_value {
					path::unset(&mut inner.values, name);
				}
				if !options.keep_error {
					inner.state.errors.remove_tree(name);
				}
				if !options.keep_dirty {
					path::unset(&mut inner.state.dirty_fields, name);
				}
				if !options.keep_touched {
					path::unset(&mut inner.state.touched_fields, name);
				}
				if !inner.options.should_unregister && !options.keep_default_value {
					path::unset(&mut inner.default_values, name);
				}
			}
			outbox.watch(None, None, &inner.values);
			let mut update = FormStateUpdate::snapshot(&inner.state);
			if !options.keep_dirty {
				update.is_dirty = Some(inner.compute_is_dirty());
			}
			inner.emit(&mut outbox, update);
			tracing::debug!(fields = ?names, "fields unregistered");
			!options.keep_is_valid && inner.interest.is_valid
		};
		self.publish(outbox);

		if refresh {
			self.update_valid(false).await?;
		}
		Ok(())
	}

	/// Settle the registry after the binding layer attached its fields
	///
	/// Unregisters fields whose handles all went away, then computes
	/// validity the first time it runs.
	pub async fn mount(&self) -> FormResult<()> {
		let (sweep, first, owed_refresh) = {
			let mut inner = self.lock();
			let un_mount = std::mem::take(&mut inner.names.un_mount);
			let sweep: Vec<String> = un_mount
				.into_iter()
				.filter(|name| inner.fields.get(name).is_none_or(|field| field.is_detached()))
				.collect();
			let first = !inner.flags.mount;
			inner.flags.mount = true;
			let owed_refresh = std::mem::take(&mut inner.flags.watch);
			(sweep, first, owed_refresh)
		};

		if !sweep.is_empty() {
			let names: Vec<&str> = sweep.iter().map(String::as_str).collect();
			self.unregister(&names, UnregisterOptions::default()).await?;
		}
		if owed_refresh {
			let mut outbox = Outbox::default();
			self.lock().emit(&mut outbox, FormStateUpdate::new());
			self.publish(outbox);
		}
		if first {
			self.update_valid(false).await?;
		}
		Ok(())
	}
}
