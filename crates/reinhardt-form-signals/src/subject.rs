//! Synchronous subject implementation

use crate::name::SubjectName;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Observer callback stored by a subject
type ObserverFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A connected observer
struct ObserverInfo<T: 'static> {
	id: u64,
	observer: ObserverFn<T>,
}

impl<T: 'static> Clone for ObserverInfo<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			observer: Arc::clone(&self.observer),
		}
	}
}

type ObserverList<T> = RwLock<Vec<ObserverInfo<T>>>;

/// A publish/subscribe channel with synchronous, in-order fan-out
///
/// Cloning a subject yields another handle to the same observer list.
pub struct Subject<T: 'static> {
	observers: Arc<ObserverList<T>>,
	next_id: Arc<AtomicU64>,
	name: SubjectName,
}

impl<T: 'static> Subject<T> {
	/// Create an empty subject
	pub fn new(name: SubjectName) -> Self {
		Self {
			observers: Arc::new(RwLock::new(Vec::new())),
			next_id: Arc::new(AtomicU64::new(0)),
			name,
		}
	}

	/// Name of this channel
	pub fn name(&self) -> &SubjectName {
		&self.name
	}

	/// Subscribe an observer to every payload published from now on
	///
	/// The observer stays connected until the returned [`Subscription`] is
	/// unsubscribed or dropped, or until [`Subject::unsubscribe`] detaches
	/// every observer.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_signals::{Subject, SubjectName};
	/// use std::sync::{Arc, Mutex};
	///
	/// let subject = Subject::<u32>::new(SubjectName::ARRAY);
	/// let received = Arc::new(Mutex::new(Vec::new()));
	///
	/// let sink = Arc::clone(&received);
	/// let _subscription = subject.subscribe(move |n| sink.lock().unwrap().push(*n));
	///
	/// subject.next(&1);
	/// subject.next(&2);
	/// assert_eq!(*received.lock().unwrap(), vec![1, 2]);
	/// ```
	pub fn subscribe<F>(&self, observer: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
		T: Send + Sync,
	{
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.observers.write().push(ObserverInfo {
			id,
			observer: Arc::new(observer),
		});
		tracing::trace!(subject = %self.name, id, "observer subscribed");

		let weak: Weak<ObserverList<T>> = Arc::downgrade(&self.observers);
		Subscription {
			detach: Some(Box::new(move || {
				if let Some(observers) = weak.upgrade() {
					observers.write().retain(|o| o.id != id);
				}
			})),
		}
	}

	/// Publish a payload to every current observer
	///
	/// Observers are called in subscription order. The observer list is
	/// snapshotted first, so an observer may subscribe, unsubscribe, or publish
	/// again without deadlocking; such changes apply to the next publication.
	pub fn next(&self, payload: &T) {
		let observers: Vec<ObserverInfo<T>> = self.observers.read().clone();
		tracing::trace!(subject = %self.name, observers = observers.len(), "publishing");
		for info in observers {
			(info.observer)(payload);
		}
	}

	/// Detach every observer from this subject
	pub fn unsubscribe(&self) {
		self.observers.write().clear();
	}

	/// Number of connected observers
	pub fn observer_count(&self) -> usize {
		self.observers.read().len()
	}
}

impl<T: 'static> Clone for Subject<T> {
	fn clone(&self) -> Self {
		Self {
			observers: Arc::clone(&self.observers),
			next_id: Arc::clone(&self.next_id),
			name: self.name.clone(),
		}
	}
}

impl<T: 'static> fmt::Debug for Subject<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subject")
			.field("name", &self.name.as_str())
			.field("observers", &self.observer_count())
			.finish()
	}
}

/// Handle returned by [`Subject::subscribe`]
///
/// Dropping the handle detaches the observer. Use [`Subscription::forget`] to
/// keep the observer connected for the lifetime of the subject.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
	detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
	/// Detach the observer now
	pub fn unsubscribe(mut self) {
		if let Some(detach) = self.detach.take() {
			detach();
		}
	}

	/// Keep the observer connected without holding the handle
	pub fn forget(mut self) {
		self.detach = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(detach) = self.detach.take() {
			detach();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.detach.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;
	use rstest::rstest;

	fn recording_subject() -> (Subject<i32>, Arc<Mutex<Vec<String>>>) {
		(Subject::new(SubjectName::STATE), Arc::new(Mutex::new(Vec::new())))
	}

	#[rstest]
	fn test_fan_out_preserves_subscription_order() {
		// Arrange
		let (subject, log) = recording_subject();
		let first = Arc::clone(&log);
		let second = Arc::clone(&log);
		let _a = subject.subscribe(move |n| first.lock().push(format!("a{n}")));
		let _b = subject.subscribe(move |n| second.lock().push(format!("b{n}")));

		// Act
		subject.next(&1);
		subject.next(&2);

		// Assert
		assert_eq!(*log.lock(), vec!["a1", "b1", "a2", "b2"]);
	}

	#[rstest]
	fn test_no_replay_for_late_subscribers() {
		// Arrange
		let (subject, log) = recording_subject();
		subject.next(&1);

		// Act
		let sink = Arc::clone(&log);
		let _sub = subject.subscribe(move |n| sink.lock().push(n.to_string()));
		subject.next(&2);

		// Assert
		assert_eq!(*log.lock(), vec!["2"]);
	}

	#[rstest]
	fn test_unsubscribe_detaches_only_that_observer() {
		// Arrange
		let (subject, log) = recording_subject();
		let first = Arc::clone(&log);
		let second = Arc::clone(&log);
		let a = subject.subscribe(move |n| first.lock().push(format!("a{n}")));
		let _b = subject.subscribe(move |n| second.lock().push(format!("b{n}")));

		// Act
		a.unsubscribe();
		subject.next(&3);

		// Assert
		assert_eq!(*log.lock(), vec!["b3"]);
		assert_eq!(subject.observer_count(), 1);
	}

	#[rstest]
	fn test_drop_detaches_and_forget_keeps() {
		let (subject, log) = recording_subject();
		let sink = Arc::clone(&log);
		{
			let _dropped = subject.subscribe(|_| {});
		}
		subject
			.subscribe(move |n| sink.lock().push(n.to_string()))
			.forget();

		subject.next(&7);

		assert_eq!(subject.observer_count(), 1);
		assert_eq!(*log.lock(), vec!["7"]);
	}

	#[rstest]
	fn test_subject_unsubscribe_clears_all() {
		let (subject, _log) = recording_subject();
		let _a = subject.subscribe(|_| {});
		let _b = subject.subscribe(|_| {});

		subject.unsubscribe();

		assert_eq!(subject.observer_count(), 0);
	}

	#[rstest]
	fn test_observer_may_publish_reentrantly() {
		// Arrange
		let (subject, log) = recording_subject();
		let inner = subject.clone();
		let sink = Arc::clone(&log);
		let _sub = subject.subscribe(move |n| {
			sink.lock().push(n.to_string());
			if *n == 1 {
				inner.next(&2);
			}
		});

		// Act
		subject.next(&1);

		// Assert
		assert_eq!(*log.lock(), vec!["1", "2"]);
	}
}
