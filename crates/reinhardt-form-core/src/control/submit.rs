//! Submission

use super::{FormControl, Outbox};
use crate::error::{FormError, FormResult};
use crate::error_map::ErrorMap;
use crate::state::FormStateUpdate;
use serde_json::Value;
use std::future::Future;

impl FormControl {
	/// Validate everything and dispatch to `on_valid` or `on_invalid`
	///
	/// Submission bookkeeping (`is_submitted`, `submit_count`,
	/// `is_submit_successful`) is recorded whether validation, the resolver or
	/// a callback fails. A callback error is returned as
	/// [`FormError::SubmitHandler`].
	pub async fn handle_submit<V, VF, I, IF>(&self, on_valid: V, on_invalid: I) -> FormResult<()>
	where
		V: FnOnce(Value) -> VF,
		VF: Future<Output = anyhow::Result<()>>,
		I: FnOnce(ErrorMap) -> IF,
		IF: Future<Output = anyhow::Result<()>>,
	{
		let mut outbox = Outbox::default();
		self.lock().emit(
			&mut outbox,
			FormStateUpdate {
				is_submitting: Some(true),
				..FormStateUpdate::default()
			},
		);
		self.publish(outbox);
		tracing::debug!("submitting form");

		let outcome = self.run_submit(on_valid, on_invalid).await;

		let mut outbox = Outbox::default();
		{
			let mut inner = self.lock();
			let successful = outcome.as_ref().is_ok_and(|valid| *valid);
			let update = FormStateUpdate {
				is_submitted: Some(true),
				is_submitting: Some(false),
				is_submit_successful: Some(successful),
				submit_count: Some(inner.state.submit_count.saturating_add(1)),
				errors: Some(inner.state.errors.clone()),
				..FormStateUpdate::default()
			};
			inner.emit(&mut outbox, update);
			tracing::debug!(
				successful,
				submit_count = inner.state.submit_count,
				"submission finished"
			);
		}
		self.publish(outbox);
		outcome.map(|_| ())
	}

	/// Submit with no invalid-path callback
	pub async fn handle_valid_submit<V, VF>(&self, on_valid: V) -> FormResult<()>
	where
		V: FnOnce(Value) -> VF,
		VF: Future<Output = anyhow::Result<()>>,
	{
		self.handle_submit(on_valid, |_| async { Ok::<_, anyhow::Error>(()) }).await
	}

	/// Returns whether the form was valid
	async fn run_submit<V, VF, I, IF>(&self, on_valid: V, on_invalid: I) -> FormResult<bool>
	where
		V: FnOnce(Value) -> VF,
		VF: Future<Output = anyhow::Result<()>>,
		I: FnOnce(ErrorMap) -> IF,
		IF: Future<Output = anyhow::Result<()>>,
	{
		let mut field_values = self.get_values();
		if self.shared.resolver.is_some() {
			let output = self.execute_schema(None).await?;
			self.lock().state.errors = output.errors;
			field_values = output.values;
		} else {
			let targets = self.lock().descriptors();
			self.execute_builtin_validation(targets, false).await;
		}

		let errors = {
			let mut inner = self.lock();
			inner.state.errors.remove_tree("root");
			inner.state.errors.clone()
		};

		if errors.is_empty() {
			let mut outbox = Outbox::default();
			self.lock().emit(
				&mut outbox,
				FormStateUpdate {
					errors: Some(ErrorMap::new()),
					..FormStateUpdate::default()
				},
			);
			self.publish(outbox);
			on_valid(field_values)
				.await
				.map_err(FormError::SubmitHandler)?;
			return Ok(true);
		}

		tracing::debug!(errors = errors.len(), "submission blocked by errors");
		on_invalid(errors).await.map_err(FormError::SubmitHandler)?;
		let mut outbox = Outbox::default();
		{
			let inner = self.lock();
			if inner.options.should_focus_error {
				if let Some(handle) = inner.first_error_handle(None) {
					outbox.focus(handle, false);
				}
			}
		}
		self.publish(outbox);
		Ok(false)
	}
}
