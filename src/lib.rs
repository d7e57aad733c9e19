//! # Reinhardt Form State
//!
//! A reactive form state engine. A [`FormControl`](prelude::FormControl)
//! owns the values of a data-entry form and everything derived from them:
//! validation errors, dirty and touched flags, submission status and the
//! identity of rows in dynamic lists.
//!
//! ## Modules
//!
//! - [`core`]: the store, rules, resolvers and field arrays
//! - [`signals`]: the subjects changes are published on
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_form_state::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let form = FormControl::new(
//!     FormOptions::new()
//!         .with_mode(ValidationMode::OnChange)
//!         .with_default_values(json!({"items": []})),
//! );
//! let items = form.field_array("items", FieldArrayOptions::default());
//! items
//!     .append(vec![json!({"sku": "a"}), json!({"sku": "b"})], FocusOptions::none())
//!     .await
//!     .unwrap();
//! let first = items.keys()[0];
//! items.swap(0, 1).await.unwrap();
//! assert_eq!(items.keys()[1], first);
//! # });
//! ```

pub mod core;
pub mod signals;

/// Commonly used types
pub mod prelude {
	pub use crate::core::{
		ErrorMap, FieldArray, FieldArrayOptions, FieldError, FieldHandle, FieldRegistration,
		FocusOptions, FormControl, FormError, FormOptions, FormResult, FormState, RegisterOptions,
		ResetOptions, Resolver, ResolverOutput, SetValueOptions, StateInterest, StateKey,
		StateSubscription, ValidateFn, ValidationMode, resolver_fn,
	};
	pub use crate::signals::Subscription;
}
