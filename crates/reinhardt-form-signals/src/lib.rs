//! # Reinhardt Form Signals
//!
//! Synchronous publish/subscribe subjects backing the form state engine.
//!
//! A [`Subject`] fans each published payload out to every observer that is
//! subscribed at the time of publication, in subscription order. There is no
//! buffering and no replay. Observers decide relevance themselves, usually with
//! [`name_matches`].
//!
//! ## Examples
//!
//! ```
//! use reinhardt_form_signals::{Subject, SubjectName};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let subject = Subject::<String>::new(SubjectName::WATCH);
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let subscription = subject.subscribe(move |_payload| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! subject.next(&"email".to_string());
//! subscription.unsubscribe();
//! subject.next(&"email".to_string());
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

pub mod interest;
pub mod name;
pub mod subject;

pub use interest::{is_path_prefix, name_matches};
pub use name::SubjectName;
pub use subject::{Subject, Subscription};
