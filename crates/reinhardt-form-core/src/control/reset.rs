//! Resetting the whole form or one field

use super::{ArrayRows, FormControl, Outbox};
use crate::differ;
use crate::error::FormResult;
use crate::error_map::ErrorMap;
use crate::options::{ResetFieldOptions, ResetOptions};
use crate::path;
use crate::state::FormStateUpdate;
use serde_json::{Map, Value};

impl FormControl {
	/// Return the form to `values`, or to its defaults
	///
	/// Supplied values become the new defaults unless
	/// `keep_default_values`. Registered fields stay registered and every
	/// field array gets fresh row keys.
	pub async fn reset(&self, values: Option<Value>, options: ResetOptions) -> FormResult<()> {
		let mut outbox = Outbox::default();
		let refresh = {
			let mut inner = self.lock();
			let supplied = values.filter(Value::is_object);
			let target = supplied.clone().unwrap_or_else(|| inner.default_values.clone());
			if !options.keep_default_values {
				if let Some(supplied) = &supplied {
					inner.default_values = supplied.clone();
				}
			}

			if !options.keep_values {
				let mut next = target.clone();
				if options.keep_dirty_values {
					for name in inner.names.mount.iter() {
						let current = inner.value_at(name);
						if !differ::deep_equal(&current, &path::get_or(&target, name, Value::Null))
							&& inner.is_field_dirty(name)
						{
							path::set(&mut next, name, current);
						}
					}
				}
				let unregister = inner.options.should_unregister;
				inner.values = match (unregister, options.keep_default_values) {
					(true, true) => target,
					(true, false) => Value::Object(Map::new()),
					(false, _) => next,
				};

				let handles: Vec<_> = inner
					.fields
					.iter()
					.flat_map(|field| {
						let value = path::get_or(&inner.values, field.name(), Value::Null);
						field
							.handles()
							.map(move |handle| (handle.clone(), value.clone()))
							.collect::<Vec<_>>()
					})
					.collect();
				for (handle, value) in handles {
					outbox.set_value(handle, value);
				}

				let arrays: Vec<String> = inner.arrays.keys().cloned().collect();
				for name in arrays {
					let len = path::get(&inner.values, &name)
						.and_then(Value::as_array)
						.map_or(0, Vec::len);
					inner.arrays.insert(name, ArrayRows::fresh(len));
				}
				outbox.array(None, &inner.values);
				outbox.watch(None, None, &inner.values);
			}

			let mounted: Vec<String> = inner
				.fields
				.iter()
				.filter(|field| field.is_mounted())
				.map(|field| field.name().to_string())
				.collect();
			if !options.keep_dirty_values {
				inner.names.mount = mounted.into_iter().collect();
			}
			inner.names.un_mount.clear();
			inner.names.array = inner.arrays.keys().cloned().collect();
			inner.names.watch.clear();
			inner.names.watch_all = false;
			inner.names.focus = None;
			inner.flags.mount = !inner.interest.is_valid || options.keep_is_valid;
			inner.flags.watch = inner.options.should_unregister;
			inner.flags.action = false;

			let keep_dirty = options.keep_dirty || options.keep_dirty_values;
			let compare_supplied = options.keep_default_values && supplied.is_some();
			let mut state = inner.state.clone();
			if !options.keep_submit_count {
				state.submit_count = 0;
			}
			if !keep_dirty {
				state.is_dirty = match &supplied {
					Some(supplied) if compare_supplied => {
						!differ::deep_equal(supplied, &inner.default_values)
					}
					_ => false,
				};
				state.dirty_fields = match &supplied {
					Some(supplied) if compare_supplied => {
						differ::dirty_fields(supplied, &inner.default_values)
					}
					_ => Value::Object(Map::new()),
				};
			}
			if !options.keep_is_submitted {
				state.is_submitted = false;
			}
			if !options.keep_touched {
				state.touched_fields = Value::Object(Map::new());
			}
			if !options.keep_errors {
				state.errors = ErrorMap::new();
			}
			if !options.keep_is_submit_successful {
				state.is_submit_successful = false;
			}
			state.is_submitting = false;
			let update = FormStateUpdate::snapshot(&state);
			inner.emit(&mut outbox, update);

			tracing::debug!(supplied = supplied.is_some(), ?options, "form reset");
			!inner.flags.mount
		};
		self.shared.delayed.cancel();
		self.publish(outbox);

		if refresh {
			self.update_valid(false).await?;
			self.lock().flags.mount = true;
		}
		Ok(())
	}

	/// Return one field to its default
	pub async fn reset_field(&self, name: &str, options: ResetFieldOptions) -> FormResult<()> {
		let name = path::normalize(name);
		let mut outbox = Outbox::default();
		let refresh = {
			let mut inner = self.lock();
			let Some(field) = inner.fields.get(&name).cloned() else {
				tracing::debug!(field = %name, "reset of unregistered field ignored");
				return Ok(());
			};

			let value = match options.default_value.clone() {
				Some(default) => {
					path::set(&mut inner.default_values, &name, default.clone());
					default
				}
				None => inner.default_at(&name),
			};
			path::set(&mut inner.values, &name, value.clone());
			for handle in field.handles() {
				outbox.set_value(handle.clone(), value.clone());
			}
			outbox.watch(Some(&name), None, &inner.values);

			if !options.keep_touched {
				path::unset(&mut inner.state.touched_fields, &name);
			}
			if !options.keep_dirty {
				path::unset(&mut inner.state.dirty_fields, &name);
				inner.state.is_dirty = inner.compute_is_dirty();
			}
			let refresh = !options.keep_error;
			if refresh {
				inner.state.errors.remove_tree(&name);
			}
			let update = FormStateUpdate::snapshot(&inner.state);
			inner.emit(&mut outbox, update);
			refresh
		};
		self.publish(outbox);

		if refresh {
			self.update_valid(false).await?;
		}
		Ok(())
	}
}
