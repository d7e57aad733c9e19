//! Validation passes over many fields

use super::{FormControl, Outbox};
use crate::error::{FormError, FormResult};
use crate::error_map::ErrorMap;
use crate::options::TriggerOptions;
use crate::path;
use crate::registry::FieldDescriptor;
use crate::resolver::{ResolverOptions, ResolverOutput};
use crate::state::FormStateUpdate;
use crate::validation::{ValidateOptions, validate_field};
use std::sync::Arc;

impl FormControl {
	/// Validate `names`, or every field when empty
	///
	/// Returns whether the requested fields are valid.
	pub async fn trigger(&self, names: &[&str]) -> FormResult<bool> {
		self.trigger_with(names, TriggerOptions::default()).await
	}

	pub async fn trigger_with(&self, names: &[&str], options: TriggerOptions) -> FormResult<bool> {
		let scope: Option<Vec<String>> =
			(!names.is_empty()).then(|| names.iter().map(|name| path::normalize(name)).collect());

		let mut outbox = Outbox::default();
		let counted = {
			let mut inner = self.lock();
			let counted = scope.clone().unwrap_or_else(|| inner.mounted_names());
			inner.begin_validating(&counted, &mut outbox);
			counted
		};
		self.publish(outbox);
		tracing::debug!(fields = ?scope, "trigger");

		let outcome = self.run_trigger(scope.as_deref()).await;

		let mut outbox = Outbox::default();
		let result = {
			let mut inner = self.lock();
			let result = match outcome {
				Ok((result, is_valid)) => {
					let single = match scope.as_deref() {
						Some([name]) => Some(name.clone()),
						_ => None,
					};
					let valid_changed = inner.interest.is_valid
						&& is_valid.is_some_and(|valid| valid != inner.state.is_valid);
					let update = FormStateUpdate {
						name: single.filter(|_| !valid_changed),
						is_valid,
						errors: Some(inner.state.errors.clone()),
						..FormStateUpdate::default()
					};
					inner.emit(&mut outbox, update);
					if options.should_focus && !result {
						if let Some(handle) = inner.first_error_handle(scope.as_deref()) {
							outbox.focus(handle, false);
						}
					}
					Ok(result)
				}
				Err(error) => Err(error),
			};
			inner.end_validating(&counted, &mut outbox);
			result
		};
		self.publish(outbox);
		result
	}

	/// Returns the trigger result and, when recomputed, aggregate validity
	async fn run_trigger(&self, scope: Option<&[String]>) -> FormResult<(bool, Option<bool>)> {
		if self.shared.resolver.is_some() {
			let output = self.execute_schema(scope.map(<[String]>::to_vec)).await?;
			let is_valid = output.errors.is_empty();
			let mut inner = self.lock();
			let result = match scope {
				Some(names) => {
					for name in names {
						inner.state.errors.merge_slice(name, output.errors.slice(name));
					}
					names
						.iter()
						.all(|name| !inner.state.errors.has_errors_under(name))
				}
				None => {
					inner.state.errors = output.errors;
					is_valid
				}
			};
			return Ok((result, Some(is_valid)));
		}

		match scope {
			Some(names) => {
				let targets = self.lock().descriptors_under(names);
				let result = self.execute_builtin_validation(targets, false).await;
				let refresh = result || self.lock().state.is_valid;
				if refresh {
					self.update_valid(false).await?;
				}
				Ok((result, None))
			}
			None => {
				let targets = self.lock().descriptors();
				let result = self.execute_builtin_validation(targets, false).await;
				Ok((result, Some(result)))
			}
		}
	}

	/// Run rule validation over `targets` in order
	///
	/// Unless `only_check_valid`, each field's error is written to or removed
	/// from the error map. When only checking, stops at the first failure.
	pub(crate) async fn execute_builtin_validation(
		&self,
		targets: Vec<FieldDescriptor>,
		only_check_valid: bool,
	) -> bool {
		let (values, base, arrays) = {
			let inner = self.lock();
			let base = ValidateOptions {
				criteria_mode: inner.options.criteria_mode,
				should_use_native_validation: inner.options.should_use_native_validation
					&& !only_check_valid,
				is_field_array: false,
			};
			(Arc::new(inner.values.clone()), base, inner.names.array.clone())
		};

		let mut valid = true;
		let mut outcomes = Vec::new();
		for field in targets {
			let is_field_array = arrays.contains(field.name());
			let value = path::get(&values, field.name()).cloned();
			let options = ValidateOptions {
				is_field_array,
				..base
			};
			let error = validate_field(&field, value.as_ref(), &values, options).await;
			if error.is_some() {
				valid = false;
				if only_check_valid {
					break;
				}
			}
			if !only_check_valid {
				outcomes.push((field.name().to_string(), error));
			}
		}

		if !outcomes.is_empty() {
			let mut inner = self.lock();
			for (name, error) in outcomes {
				let key = inner.error_key(&name);
				match error {
					Some(error) => {
						inner.state.errors.insert(&key, error);
					}
					None => {
						inner.state.errors.remove(&key);
					}
				}
			}
		}
		valid
	}

	/// Run the resolver for `names`, or every mounted field
	pub(crate) async fn execute_schema(
		&self,
		names: Option<Vec<String>>,
	) -> FormResult<ResolverOutput> {
		let (values, context, options) = {
			let inner = self.lock();
			let names = names.unwrap_or_else(|| inner.mounted_names());
			let fields = names
				.iter()
				.filter_map(|name| inner.fields.get(name).cloned())
				.collect();
			let options = ResolverOptions {
				criteria_mode: inner.options.criteria_mode,
				names,
				fields,
				should_use_native_validation: inner.options.should_use_native_validation,
			};
			(inner.values.clone(), inner.options.context.clone(), options)
		};
		let Some(resolver) = self.shared.resolver.clone() else {
			return Ok(ResolverOutput {
				values,
				errors: ErrorMap::new(),
			});
		};
		resolver.resolve(values, context, options).await.map_err(|error| {
			tracing::warn!(error = %error, "resolver failed");
			FormError::Resolver(error)
		})
	}

	/// Recompute aggregate validity when some consumer reads it
	///
	/// Never writes errors. Publishes a change unless `skip_render`.
	pub(crate) async fn update_valid(&self, skip_render: bool) -> FormResult<Option<bool>> {
		let targets = {
			let inner = self.lock();
			if !inner.interest.is_valid {
				return Ok(None);
			}
			inner.descriptors()
		};
		let is_valid = if self.shared.resolver.is_some() {
			self.execute_schema(None).await?.errors.is_empty()
		} else {
			self.execute_builtin_validation(targets, true).await
		};

		if !skip_render {
			let mut outbox = Outbox::default();
			{
				let mut inner = self.lock();
				if inner.state.is_valid != is_valid {
					let update = FormStateUpdate {
						is_valid: Some(is_valid),
						..FormStateUpdate::default()
					};
					inner.emit(&mut outbox, update);
				}
			}
			self.publish(outbox);
		}
		Ok(Some(is_valid))
	}
}
