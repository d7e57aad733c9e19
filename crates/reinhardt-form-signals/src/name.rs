//! Subject names

use std::fmt;
use std::sync::Arc;

/// Internal storage for subject names, supporting both static and owned strings.
#[derive(Debug, Clone)]
enum SubjectNameInner {
	Static(&'static str),
	Owned(Arc<str>),
}

/// Name of a notification channel
///
/// The form engine publishes on three built-in channels. Custom names are
/// available for channels created by binding layers.
///
/// # Examples
///
/// ```
/// use reinhardt_form_signals::SubjectName;
///
/// assert_eq!(SubjectName::STATE.as_str(), "state");
/// assert_eq!(SubjectName::custom("focus").as_str(), "focus");
/// ```
#[derive(Debug, Clone)]
pub struct SubjectName(SubjectNameInner);

impl SubjectName {
	/// Value-change notifications
	pub const WATCH: Self = Self(SubjectNameInner::Static("watch"));
	/// Field-array structural changes
	pub const ARRAY: Self = Self(SubjectNameInner::Static("array"));
	/// Aggregate form state deltas
	pub const STATE: Self = Self(SubjectNameInner::Static("state"));

	/// Create a custom subject name
	pub fn custom(name: impl Into<String>) -> Self {
		let name: String = name.into();
		Self(SubjectNameInner::Owned(Arc::from(name)))
	}

	/// Get the name as a string slice
	pub fn as_str(&self) -> &str {
		match &self.0 {
			SubjectNameInner::Static(s) => s,
			SubjectNameInner::Owned(s) => s,
		}
	}
}

impl fmt::Display for SubjectName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl PartialEq for SubjectName {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for SubjectName {}
