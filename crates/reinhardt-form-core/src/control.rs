//! The form state store
//!
//! [`FormControl`] owns values, defaults, the field registry and the
//! aggregate [`FormState`]. It is a cheap handle: clones share one store.
//!
//! Every mutation runs under a single lock and queues its notifications.
//! They are delivered in order once the lock is released, so observers are
//! free to call back into the control.
//!
//! ## Examples
//!
//! ```
//! use reinhardt_form_core::{FormControl, FormOptions, RegisterOptions, ValidationMode};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let form = FormControl::new(
//!     FormOptions::new()
//!         .with_mode(ValidationMode::OnChange)
//!         .with_default_values(json!({"email": ""})),
//! );
//! let email = form.register("email", RegisterOptions::new().with_required("Email is required"));
//!
//! email.on_change(json!("")).await.unwrap();
//! assert!(form.form_state().errors.contains("email"));
//!
//! email.on_change(json!("me@example.com")).await.unwrap();
//! assert!(form.form_state().errors.is_empty());
//! # });
//! ```

mod events;
mod inner;
mod register;
mod reset;
mod submit;
mod validate;
mod values;

pub use register::FieldRegistration;

pub(crate) use inner::{ArrayRows, FormInner, Outbox};

use crate::delay::DelayedError;
use crate::error::{FormError, FormResult};
use crate::error_map::FieldError;
use crate::options::{FormOptions, SetErrorOptions, SetFocusOptions};
use crate::path;
use crate::payload::{Subjects, WatchPayload};
use crate::resolver::Resolver;
use crate::state::{FieldState, FormState, FormStateUpdate, StateInterest, should_render_form_state};
use parking_lot::{Mutex, MutexGuard};
use reinhardt_form_signals::{Subscription, name_matches};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub(crate) struct Shared {
	pub(crate) inner: Mutex<FormInner>,
	pub(crate) subjects: Subjects,
	pub(crate) resolver: Option<Arc<dyn Resolver>>,
	pub(crate) delayed: DelayedError,
}

/// Filter for [`FormControl::subscribe_form_state`]
#[derive(Debug, Clone, Default)]
pub struct StateSubscription {
	/// Paths of interest; every path when empty
	pub names: Vec<String>,
	/// Match names exactly instead of by path prefix
	pub exact: bool,
	pub interest: StateInterest,
}

impl StateSubscription {
	pub fn new(interest: StateInterest) -> Self {
		Self {
			interest,
			..Self::default()
		}
	}

	pub fn with_names<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.names = names.into_iter().map(Into::into).collect();
		self
	}

	pub fn exact(mut self) -> Self {
		self.exact = true;
		self
	}
}

/// Handle to a form state store
#[derive(Clone)]
pub struct FormControl {
	pub(crate) shared: Arc<Shared>,
}

impl FormControl {
	pub fn new(options: FormOptions) -> Self {
		tracing::debug!(
			mode = ?options.mode,
			re_validate_mode = ?options.re_validate_mode,
			resolver = options.resolver.is_some(),
			"creating form control"
		);
		let resolver = options.resolver.clone();
		Self {
			shared: Arc::new(Shared {
				inner: Mutex::new(FormInner::new(options)),
				subjects: Subjects::new(),
				resolver,
				delayed: DelayedError::default(),
			}),
		}
	}

	pub(crate) fn lock(&self) -> MutexGuard<'_, FormInner> {
		self.shared.inner.lock()
	}

	pub(crate) fn publish(&self, outbox: Outbox) {
		outbox.deliver(&self.shared.subjects);
	}

	/// The three notification channels
	pub fn subjects(&self) -> &Subjects {
		&self.shared.subjects
	}

	/// Snapshot of the aggregate state
	pub fn form_state(&self) -> FormState {
		self.lock().state.clone()
	}

	/// Current default values
	pub fn default_values(&self) -> Value {
		self.lock().default_values.clone()
	}

	/// Options the control was created with
	pub fn options(&self) -> FormOptions {
		self.lock().options.clone()
	}

	/// Register consumer interest in state keys
	///
	/// Keys nobody declared are neither computed eagerly nor published.
	/// Interest accumulates for the life of the control.
	pub fn declare_interest(&self, interest: StateInterest) {
		let mut inner = self.lock();
		inner.interest = inner.interest.union(interest);
	}

	/// Observe state deltas relevant to `subscription`
	///
	/// Declares the subscription's interest as a side effect.
	pub fn subscribe_form_state<F>(
		&self,
		subscription: StateSubscription,
		observer: F,
	) -> Subscription
	where
		F: Fn(&FormStateUpdate) + Send + Sync + 'static,
	{
		self.declare_interest(subscription.interest);
		let StateSubscription {
			names,
			exact,
			interest,
		} = subscription;
		self.shared.subjects.state.subscribe(move |update| {
			if name_matches(Some(names.as_slice()), update.name.as_deref(), exact)
				&& should_render_form_state(update, &interest)
			{
				observer(update);
			}
		})
	}

	/// Observe value changes under `names`
	///
	/// The observer receives the payload and the watched value: the whole tree
	/// when `names` is empty, the value for a single name, or an array of
	/// values otherwise.
	pub fn watch_fields<F>(&self, names: Vec<String>, exact: bool, observer: F) -> Subscription
	where
		F: Fn(&WatchPayload, Value) + Send + Sync + 'static,
	{
		self.shared.subjects.watch.subscribe(move |payload| {
			if name_matches(Some(names.as_slice()), payload.name.as_deref(), exact) {
				observer(payload, values::select(&payload.values, &names));
			}
		})
	}

	/// Per-field view of the state
	pub fn get_field_state(&self, name: &str) -> FieldState {
		let name = path::normalize(name);
		let inner = self.lock();
		FieldState {
			invalid: inner.state.errors.has_errors_under(&name),
			is_dirty: inner.is_field_dirty(&name),
			is_touched: inner.is_field_touched(&name),
			error: inner.state.errors.get(&name).cloned(),
		}
	}

	/// Record an error at `name` by hand
	///
	/// The aggregate becomes invalid until the next validation pass.
	pub fn set_error(&self, name: &str, error: FieldError, options: SetErrorOptions) {
		let name = path::normalize(name);
		let mut outbox = Outbox::default();
		{
			let mut inner = self.lock();
			let handle = inner
				.fields
				.get(&name)
				.and_then(|field| field.primary_handle().cloned());
			inner
				.state
				.errors
				.insert(&name, error.with_handle(handle.clone()));
			let update = FormStateUpdate {
				errors: Some(inner.state.errors.clone()),
				is_valid: Some(false),
				..FormStateUpdate::named(&name)
			};
			inner.emit(&mut outbox, update);
			if let Some(handle) = handle.filter(|_| options.should_focus) {
				outbox.focus(handle, false);
			}
		}
		tracing::debug!(field = %name, "error set manually");
		self.publish(outbox);
	}

	/// Remove errors at and below `names`, or every error when empty
	pub fn clear_errors(&self, names: &[&str]) {
		let mut outbox = Outbox::default();
		{
			let mut inner = self.lock();
			if names.is_empty() {
				inner.state.errors = Default::default();
			} else {
				for name in names {
					inner.state.errors.remove_tree(&path::normalize(name));
				}
			}
			let update = FormStateUpdate {
				errors: Some(inner.state.errors.clone()),
				..FormStateUpdate::default()
			};
			inner.emit(&mut outbox, update);
		}
		self.publish(outbox);
	}

	/// Move focus to a registered field
	pub fn set_focus(&self, name: &str, options: SetFocusOptions) -> FormResult<()> {
		let name = path::normalize(name);
		let handle = {
			let inner = self.lock();
			let field = inner
				.fields
				.get(&name)
				.ok_or_else(|| FormError::UnknownField(name.clone()))?;
			field.primary_handle().cloned()
		};
		match handle {
			Some(handle) => {
				handle.focus();
				if options.should_select {
					handle.select();
				}
			}
			None => tracing::debug!(field = %name, "no handle attached, focus skipped"),
		}
		Ok(())
	}
}

impl fmt::Debug for FormControl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.lock();
		f.debug_struct("FormControl")
			.field("fields", &inner.fields.len())
			.field("values", &inner.values)
			.field("state", &inner.state)
			.finish()
	}
}
