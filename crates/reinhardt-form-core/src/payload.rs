//! Payloads published on the three channels

use crate::state::FormStateUpdate;
use reinhardt_form_signals::{Subject, SubjectName};
use serde_json::Value;
use std::sync::Arc;

/// What caused a value notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
	/// A field change event from the binding layer
	Change,
}

/// Value-change notification
///
/// `values` is an immutable snapshot of the whole values tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPayload {
	pub name: Option<String>,
	pub event: Option<EventType>,
	pub values: Arc<Value>,
}

/// Field-array structural change
///
/// A payload without a name concerns every array (reset).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPayload {
	pub name: Option<String>,
	pub values: Arc<Value>,
}

/// The three channels of a form
#[derive(Debug, Clone)]
pub struct Subjects {
	pub watch: Subject<WatchPayload>,
	pub array: Subject<ArrayPayload>,
	pub state: Subject<FormStateUpdate>,
}

impl Subjects {
	pub fn new() -> Self {
		Self {
			watch: Subject::new(SubjectName::WATCH),
			array: Subject::new(SubjectName::ARRAY),
			state: Subject::new(SubjectName::STATE),
		}
	}

	/// Detach every observer of every channel
	pub fn unsubscribe_all(&self) {
		self.watch.unsubscribe();
		self.array.unsubscribe();
		self.state.unsubscribe();
	}
}

impl Default for Subjects {
	fn default() -> Self {
		Self::new()
	}
}
