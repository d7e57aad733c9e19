//! Debounced display of field-event errors
//!
//! At most one error is pending per form. Arming a new one cancels the
//! previous; `flush` hands the pending error back for immediate display.

use crate::error_map::FieldError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;

struct Pending {
	id: u64,
	name: String,
	error: FieldError,
	task: Option<JoinHandle<()>>,
}

impl Pending {
	fn cancel(self) -> (String, FieldError) {
		if let Some(task) = self.task {
			task.abort();
		}
		(self.name, self.error)
	}
}

#[derive(Default)]
pub(crate) struct DelayedError {
	pending: Mutex<Option<Pending>>,
	next_id: AtomicU64,
}

impl DelayedError {
	/// Store `error` as the pending one and return its ticket
	pub(crate) fn arm(&self, name: String, error: FieldError) -> u64 {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let previous = self.pending.lock().replace(Pending {
			id,
			name,
			error,
			task: None,
		});
		if let Some(previous) = previous {
			tracing::trace!(field = %previous.name, "delayed error superseded");
			previous.cancel();
		}
		id
	}

	/// Bind the timer task to ticket `id`
	///
	/// A ticket that already fired or was superseded leaves the slot alone.
	pub(crate) fn bind(&self, id: u64, task: JoinHandle<()>) {
		if let Some(pending) = self.pending.lock().as_mut().filter(|p| p.id == id) {
			pending.task = Some(task);
		}
	}

	/// Take the pending error if `id` is still current
	pub(crate) fn take(&self, id: u64) -> Option<(String, FieldError)> {
		let mut slot = self.pending.lock();
		if slot.as_ref().is_some_and(|p| p.id == id) {
			slot.take().map(|p| (p.name, p.error))
		} else {
			None
		}
	}

	/// Cancel the timer and return the pending error
	pub(crate) fn flush(&self) -> Option<(String, FieldError)> {
		let pending = self.pending.lock().take();
		pending.map(Pending::cancel)
	}

	pub(crate) fn cancel(&self) {
		self.flush();
	}

	pub(crate) fn is_pending(&self) -> bool {
		self.pending.lock().is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error_map::ErrorType;
	use rstest::rstest;

	fn error(message: &str) -> FieldError {
		FieldError::new(ErrorType::Required, message)
	}

	#[rstest]
	fn test_newer_ticket_supersedes_older() {
		// Arrange
		let delayed = DelayedError::default();
		let first = delayed.arm("email".into(), error("first"));
		let second = delayed.arm("email".into(), error("second"));

		// Act
		let stale = delayed.take(first);
		let current = delayed.take(second);

		// Assert
		assert!(stale.is_none());
		assert_eq!(current.map(|(_, e)| e.message), Some("second".to_string()));
		assert!(!delayed.is_pending());
	}

	#[rstest]
	fn test_flush_returns_pending_error_once() {
		let delayed = DelayedError::default();
		delayed.arm("name".into(), error("required"));

		let flushed = delayed.flush();

		assert_eq!(flushed.map(|(name, _)| name), Some("name".to_string()));
		assert!(delayed.flush().is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_flush_aborts_bound_timer() {
		// Arrange
		let delayed = DelayedError::default();
		let id = delayed.arm("name".into(), error("required"));
		let task = tokio::spawn(async {
			tokio::time::sleep(std::time::Duration::from_secs(60)).await;
		});
		delayed.bind(id, task);

		// Act
		let flushed = delayed.flush();

		// Assert
		assert!(flushed.is_some());
		assert!(!delayed.is_pending());
	}
}
