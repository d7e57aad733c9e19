//! Engine-level errors
//!
//! Rule violations are never reported through [`FormError`]; they are data in
//! an [`ErrorMap`](crate::ErrorMap). This type covers failures raised by
//! external collaborators and malformed configuration.

use thiserror::Error;

/// Errors raised by form operations
#[derive(Debug, Error)]
pub enum FormError {
	/// The configured resolver failed
	#[error("resolver failed: {0}")]
	Resolver(#[source] anyhow::Error),
	/// A submit callback (`on_valid` or `on_invalid`) failed
	#[error("submit handler failed: {0}")]
	SubmitHandler(#[source] anyhow::Error),
	/// A settings document could not be parsed
	#[error("invalid form settings: {0}")]
	Settings(#[from] serde_json::Error),
	/// The operation needs a registered field
	#[error("field '{0}' is not registered")]
	UnknownField(String),
}

/// Result alias for form operations
pub type FormResult<T> = Result<T, FormError>;
