//! Form state store, validation and field arrays
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_form_state::core::{FormControl, FormOptions, RegisterOptions};
//! use serde_json::json;
//!
//! let form = FormControl::new(FormOptions::new().with_default_values(json!({"name": ""})));
//! form.register("name", RegisterOptions::new().required());
//! assert_eq!(form.get_values(), json!({"name": ""}));
//! ```

pub use reinhardt_form_core::*;
