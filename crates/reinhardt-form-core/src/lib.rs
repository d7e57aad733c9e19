//! Reactive form state engine for Reinhardt
//!
//! This crate keeps the authoritative state of a data-entry form:
//! - Values and defaults addressed by dotted paths (`items.0.name`)
//! - A registry of fields with their validation rules and live handles
//! - Rule validation, or an external whole-form [`Resolver`]
//! - Dirty and touched tracking against the defaults
//! - Submission, reset and unregistration lifecycles
//! - Field arrays whose rows keep stable identity through reordering
//!
//! Changes are announced on three [`Subjects`] (watch, array, state). State
//! deltas are computed only for keys some consumer declared interest in.
//!
//! ## Examples
//!
//! ```
//! use reinhardt_form_core::{
//!     FormControl, FormOptions, RegisterOptions, StateInterest, StateKey,
//! };
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let form = FormControl::new(FormOptions::new().with_default_values(json!({"name": ""})));
//! form.declare_interest(StateInterest::new().with(StateKey::IsDirty));
//! let name = form.register("name", RegisterOptions::new().with_required("Name is required"));
//!
//! name.on_change(json!("Ada")).await.unwrap();
//! assert!(form.form_state().is_dirty);
//!
//! let mut submitted = None;
//! form.handle_valid_submit(|values| {
//!     submitted = Some(values);
//!     async { Ok::<_, anyhow::Error>(()) }
//! })
//! .await
//! .unwrap();
//! assert_eq!(submitted, Some(json!({"name": "Ada"})));
//! # });
//! ```

pub mod control;
mod delay;
pub mod differ;
pub mod error;
pub mod error_map;
pub mod field_array;
pub mod handle;
pub mod mode;
pub mod options;
pub mod path;
pub mod payload;
pub mod registry;
pub mod resolver;
pub mod rules;
pub mod state;
pub mod validation;

pub use control::{FieldRegistration, FormControl, StateSubscription};
pub use error::{FormError, FormResult};
pub use error_map::{ErrorMap, ErrorType, FieldError};
pub use field_array::{FieldArray, FieldArrayOptions, FieldArrayRow, FocusOptions, StableKey};
pub use handle::{FieldHandle, FieldKind, HandleRef};
pub use mode::{CriteriaMode, FieldEventKind, ReValidateMode, ValidationMode, skip_validation};
pub use options::{
	FormOptions, FormSettings, ResetFieldOptions, ResetOptions, SetErrorOptions, SetFocusOptions,
	SetValueOptions, TriggerOptions, UnregisterOptions,
};
pub use payload::{ArrayPayload, EventType, Subjects, WatchPayload};
pub use registry::{FieldDescriptor, FieldRegistry, Names};
pub use resolver::{FnResolver, Resolver, ResolverOptions, ResolverOutput, resolver_fn};
pub use rules::{Bound, RegisterOptions, RuleValue, Validate, ValidateFn, ValueAs, Validity};
pub use state::{
	FieldState, FormState, FormStateUpdate, StateInterest, StateKey, should_render_form_state,
};
pub use validation::{ValidateOptions, validate_field};

pub use reinhardt_form_signals::Subscription;
