//! Field change and blur events

use super::{FormControl, Outbox};
use crate::error::FormResult;
use crate::error_map::FieldError;
use crate::mode::{FieldEventKind, ValidationMode, skip_validation};
use crate::path;
use crate::payload::EventType;
use crate::registry::FieldDescriptor;
use crate::resolver::schema_error_lookup;
use crate::state::FormStateUpdate;
use crate::validation::{ValidateOptions, validate_field};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub(crate) enum FieldEvent {
	Change(Value),
	Blur,
}

/// A field event that passed the mode policy and awaits validation
struct Pending {
	field: FieldDescriptor,
	value: Value,
	field_state: Option<FormStateUpdate>,
	generation: u64,
}

/// Outcome of validating one field event
struct Verdict {
	error: Option<FieldError>,
	/// Where the error lives; an ancestor for some resolver errors
	error_name: String,
	is_valid: Option<bool>,
}

impl FormControl {
	pub(crate) async fn handle_field_event(&self, name: &str, event: FieldEvent) -> FormResult<()> {
		let name = path::normalize(name);
		let is_blur = matches!(event, FieldEvent::Blur);
		let mut outbox = Outbox::default();

		let (pending, refresh_valid) = {
			let mut inner = self.lock();
			let Some(field) = inner.fields.get(&name).cloned() else {
				tracing::debug!(field = %name, "event for unregistered field ignored");
				return Ok(());
			};
			inner.flags.mount = true;

			let value = match event {
				FieldEvent::Change(value) => field.options().coerce(value),
				FieldEvent::Blur => inner.value_at(&name),
			};
			let has_rules = field.options().has_validation()
				|| self.shared.resolver.is_some()
				|| inner.state.errors.contains(&name)
				|| !field.options().deps.is_empty();
			let kind = FieldEventKind {
				is_blur,
				is_touched: inner.is_field_touched(&name),
				is_submitted: inner.state.is_submitted,
			};
			let skip = !has_rules
				|| skip_validation(kind, inner.options.mode, inner.options.re_validate_mode);
			let watched = inner.names.is_watched(&name, is_blur);

			if !is_blur {
				path::set(&mut inner.values, &name, value.clone());
			}
			let field_state = inner.update_touch_and_dirty(&name, &value, is_blur, false);
			if !is_blur {
				outbox.watch(Some(&name), Some(EventType::Change), &inner.values);
			}

			if skip {
				let refresh_valid = inner.interest.is_valid
					&& (inner.options.mode == ValidationMode::OnBlur) == is_blur;
				if field_state.is_some() || watched {
					let update = match field_state {
						Some(update) if !watched => update,
						_ => FormStateUpdate::named(&name),
					};
					inner.emit(&mut outbox, update);
				}
				(None, refresh_valid)
			} else {
				if !is_blur && watched {
					inner.emit(&mut outbox, FormStateUpdate::new());
				}
				let generation = inner.next_generation(&name);
				inner.begin_validating(std::slice::from_ref(&name), &mut outbox);
				let pending = Pending {
					field,
					value,
					field_state,
					generation,
				};
				(Some(pending), false)
			}
		};

		if is_blur {
			if let Some((error_name, error)) = self.shared.delayed.flush() {
				self.apply_delayed_error(error_name, error);
			}
		}
		self.publish(outbox);

		let Some(pending) = pending else {
			if refresh_valid {
				self.update_valid(false).await?;
			}
			return Ok(());
		};

		let verdict = match self.validate_event(&name, &pending).await {
			Ok(verdict) => verdict,
			Err(error) => {
				self.release(&name);
				return Err(error);
			}
		};

		if !self.lock().is_current_generation(&name, pending.generation) {
			tracing::trace!(field = %name, "stale validation result discarded");
			self.release(&name);
			return Ok(());
		}

		let deps = &pending.field.options().deps;
		if !deps.is_empty() {
			let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
			if let Err(error) = self.trigger(&deps).await {
				self.release(&name);
				return Err(error);
			}
		}

		self.render_field_error(&name, verdict, pending.field_state);
		Ok(())
	}

	async fn validate_event(&self, name: &str, pending: &Pending) -> FormResult<Verdict> {
		if self.shared.resolver.is_some() {
			let output = self.execute_schema(Some(vec![name.to_string()])).await?;
			let inner = self.lock();
			let boundary = |path: &str| inner.is_field_boundary(path);
			let (_, previous_name) = schema_error_lookup(&inner.state.errors, boundary, name);
			let (error, error_name) = schema_error_lookup(&output.errors, boundary, &previous_name);
			return Ok(Verdict {
				error,
				error_name,
				is_valid: Some(output.errors.is_empty()),
			});
		}

		let (values, options) = {
			let inner = self.lock();
			let options = ValidateOptions {
				criteria_mode: inner.options.criteria_mode,
				should_use_native_validation: inner.options.should_use_native_validation,
				is_field_array: inner.names.array.contains(name),
			};
			(Arc::new(inner.values.clone()), options)
		};
		let error = validate_field(&pending.field, Some(&pending.value), &values, options).await;
		let is_valid = self.update_valid(true).await?;
		let error_name = self.lock().error_key(name);
		Ok(Verdict {
			error,
			error_name,
			is_valid,
		})
	}

	/// Write the verdict and publish the field's state
	fn render_field_error(
		&self,
		name: &str,
		verdict: Verdict,
		field_state: Option<FormStateUpdate>,
	) {
		let Verdict {
			error,
			error_name,
			is_valid,
		} = verdict;
		let mut outbox = Outbox::default();
		let delayed = {
			let mut inner = self.lock();
			let previous = inner.state.errors.get(&error_name).cloned();
			let valid_changed = inner.interest.is_valid
				&& is_valid.is_some_and(|valid| valid != inner.state.is_valid);

			let delayed = match (inner.options.delay_error, &error) {
				(Some(delay), Some(error)) => Some((delay, error.clone())),
				_ => {
					self.shared.delayed.cancel();
					match &error {
						Some(error) => {
							inner.state.errors.insert(&error_name, error.clone());
						}
						None => {
							inner.state.errors.remove(&error_name);
						}
					}
					None
				}
			};

			let error_changed = match &error {
				Some(error) => previous.as_ref() != Some(error),
				None => previous.is_some(),
			};
			if error_changed || field_state.is_some() || valid_changed {
				let mut update = field_state.unwrap_or_default();
				update.name = Some(error_name.clone());
				if valid_changed {
					update.is_valid = is_valid;
				}
				update.errors = Some(inner.state.errors.clone());
				inner.emit(&mut outbox, update);
			}
			inner.end_validating(&[name.to_string()], &mut outbox);
			delayed
		};
		self.publish(outbox);

		if let Some((delay, error)) = delayed {
			self.schedule_error(error_name, error, delay);
		}
	}

	/// Drop the in-flight mark of an abandoned event
	fn release(&self, name: &str) {
		let mut outbox = Outbox::default();
		self.lock().end_validating(&[name.to_string()], &mut outbox);
		self.publish(outbox);
	}

	/// Display `error` after `delay` unless superseded first
	fn schedule_error(&self, name: String, error: FieldError, delay: Duration) {
		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			tracing::warn!(
				field = %name,
				"no async runtime for delayed error, showing immediately"
			);
			self.apply_delayed_error(name, error);
			return;
		};
		let ticket = self.shared.delayed.arm(name, error);
		let shared = Arc::downgrade(&self.shared);
		let task = runtime.spawn(async move {
			tokio::time::sleep(delay).await;
			let Some(shared) = shared.upgrade() else {
				return;
			};
			let control = FormControl { shared };
			if let Some((name, error)) = control.shared.delayed.take(ticket) {
				control.apply_delayed_error(name, error);
			}
		});
		self.shared.delayed.bind(ticket, task);
	}

	pub(crate) fn apply_delayed_error(&self, name: String, error: FieldError) {
		let mut outbox = Outbox::default();
		{
			let mut inner = self.lock();
			inner.state.errors.insert(&name, error);
			let update = FormStateUpdate {
				errors: Some(inner.state.errors.clone()),
				..FormStateUpdate::default()
			};
			inner.emit(&mut outbox, update);
		}
		tracing::trace!(field = %name, "delayed error displayed");
		self.publish(outbox);
	}
}
